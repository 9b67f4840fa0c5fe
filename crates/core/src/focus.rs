//! Daily focus tasks.

/// Number of tasks generated per day.
pub const FOCUS_TASK_COUNT: usize = 5;

/// Maximum stored length of a task.
pub const MAX_TASK_CHARS: usize = 500;

/// Tasks used when the model produces nothing usable.
pub const DEFAULT_FOCUS_TASKS: [&str; FOCUS_TASK_COUNT] = [
    "Write 500 words in your current chapter.",
    "Review the motivation of your antagonist.",
    "Outline the next three scenes on your timeline.",
    "Add a sensory detail to your most recent scene.",
    "Check one subplot for loose threads.",
];

/// Tidy model-generated task lines: strip list markers, drop blanks, cap
/// length and count.
pub fn clean_tasks<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raw.into_iter()
        .map(|t| {
            t.as_ref()
                .trim()
                .trim_start_matches(|c: char| c == '-' || c == '*' || c == '•' || c.is_ascii_digit() || c == '.' || c == ')')
                .trim()
                .chars()
                .take(MAX_TASK_CHARS)
                .collect::<String>()
        })
        .filter(|t| !t.is_empty())
        .take(FOCUS_TASK_COUNT)
        .collect()
}

/// Default tasks as owned strings.
pub fn default_tasks() -> Vec<String> {
    DEFAULT_FOCUS_TASKS.iter().map(|t| t.to_string()).collect()
}
