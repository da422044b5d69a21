// prompt-optimizer-rs/src/prompts.rs
// Request texts sent to the completion service.

pub(crate) const REFLECTION_MARKER: &str = "REFLECTION:";
pub(crate) const IMPROVED_PROMPT_MARKER: &str = "IMPROVED PROMPT:";

pub(crate) const SEED_GUIDELINES: &str = "\
You are an expert in prompt engineering who writes precise, effective and well-structured prompts for language models.
Write an initial system prompt for the task below, following these guidelines:
* Give clear instructions with every detail the model needs; do not leave it guessing.
* Assign the model a persona suited to the task.
* Use delimiters (XML tags, section titles, quotes) to separate distinct parts of the input.
* Spell out the steps needed to complete the task when it has several.
* Include short examples when they make the expected output easier to follow.
* The prompt will be used as a system message and the user input arrives in a separate message, so do not add a placeholder for it.";

pub(crate) const CONTEXT_QA_TASK: &str = "\
Answer a user's question using only the context documents supplied with it. Requirements:
* Answer strictly from the supplied context; never use outside knowledge.
* Cite the supporting source inline for every claim.
* When the context does not contain enough information, say so explicitly instead of guessing.
* Reason step by step before stating the final answer.";

pub(crate) fn seed_request(task_description: &str) -> String {
    format!(
        "{}\n\nTask:\n<task>\n{}\n</task>\n\nReturn only the prompt text without additional commentary.",
        SEED_GUIDELINES, task_description
    )
}

pub(crate) const JUDGE_SYSTEM: &str = "\
You evaluate a newly generated answer against a reference (old) answer for a specific question.
Read the criteria carefully before judging and reply only in the requested JSON format.";

pub(crate) fn judge_request(question: &str, expected: &str, actual: &str) -> String {
    format!(
        r#"Question:
<question>
{question}
</question>

Reference (old) answer:
<expected_answer>
{expected}
</expected_answer>

New answer:
<actual_answer>
{actual}
</actual_answer>

A "no-information answer" is one such as "I don't know" or "I cannot answer due to lack of information".
Choose exactly one label:

1. Improvement: the old answer is a no-information answer and the new answer addresses the question. Never use it when both answers are no-information answers or when they are identical.
2. Degraded: the old answer addresses the question and the new answer is a no-information answer. Never use it when both answers are no-information answers or when they are identical.
3. Information Gain: both answers contain relevant information and the new one is more accurate, relevant or detailed. Never use it when the old answer is a no-information answer.
4. Information Gap: both answers contain relevant information and the new one is less accurate, relevant or detailed. Never use it when the new answer is a no-information answer.
5. Similar: both answers contain relevant information and are comparable in quality, content and relevance. Never use it when either answer is a no-information answer.
6. Inadequate: both answers are no-information answers. Never use it when either answer contains relevant information.

Steps:
1. Read the question, the old answer and the new answer.
2. Compare the new answer to the old answer against the criteria.
3. Pick the single label whose conditions hold.

Respond with a JSON object of this shape:
{{
  "analysis": "your reasoning, covering each relevant criterion",
  "result": "one of Improvement, Degraded, Information Gain, Information Gap, Similar, Inadequate"
}}"#
    )
}

pub(crate) fn reflection_request(
    task_description: Option<&str>,
    prompt: &str,
    accuracy: f64,
    results_json: &str,
) -> String {
    let task = task_description.unwrap_or("Infer the task from the prompt and the test results.");
    format!(
        r#"You are a prompt optimizer that improves prompts iteratively from test results. Analyze how well the current prompt achieves the task, identify what works and what does not from the accuracy and the individual results, and write an improved prompt.

Instructions:
1. Identify the goal of the task.
2. Examine the accuracy and the results, including both correct and incorrect cases, to find patterns of success and failure.
3. Reflect on the prompt:
   * Which parts lead to correct outputs?
   * Which parts cause errors or inefficiencies?
   * Is it too vague, too restrictive, or missing key instructions?
   * Does the output format match what is expected?
4. Write an updated prompt that keeps what works, fixes what does not, and stays aligned with the task.

Task: {task}

Current Prompt:
"{prompt}"

Current Accuracy: {accuracy:.2}%

Results from testing:

{results_json}

Format your response exactly as follows, using both markers in this order:

{REFLECTION_MARKER}
[Your detailed analysis of the current prompt's strengths and weaknesses]

{IMPROVED_PROMPT_MARKER}
[The complete new prompt text without any additional information]"#
    )
}
