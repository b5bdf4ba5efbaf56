/// Stitches a Chuck Norris joke and a dad joke into one text.
///
/// Dad jokes shaped as a question and an answer wrap the Chuck Norris joke:
/// `"{question} {chuck} {answer}"`. Anything else is appended after a
/// connective: `"{chuck} Meanwhile, {dad}"`. Both inputs survive verbatim
/// (modulo surrounding whitespace and a closing period added to the first).
pub fn combine(chuck: &str, dad: &str) -> String {
    let chuck = chuck.trim();
    let dad = dad.trim();

    match (chuck.is_empty(), dad.is_empty()) {
        (true, true) => return String::new(),
        (true, false) => return dad.to_string(),
        (false, true) => return chuck.to_string(),
        (false, false) => {}
    }

    let chuck = with_terminal_punctuation(chuck);

    match split_question(dad) {
        Some((question, answer)) => format!("{} {} {}", question, chuck, answer),
        None => format!("{} Meanwhile, {}", chuck, dad),
    }
}

fn with_terminal_punctuation(text: &str) -> String {
    if text.ends_with(|c: char| matches!(c, '.' | '!' | '?')) {
        text.to_string()
    } else {
        format!("{}.", text)
    }
}

/// Splits `"Why ...? Because ..."` into its question (with the `?`) and a
/// non-empty answer.
fn split_question(text: &str) -> Option<(&str, &str)> {
    let end = text.find('?')? + 1;
    let (question, answer) = text.split_at(end);
    let answer = answer.trim();

    if answer.is_empty() {
        None
    } else {
        Some((question, answer))
    }
}
