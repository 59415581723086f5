//! Turning raw input into symbols and back

/// One symbol per byte
pub fn tokenize_bytes(input: &[u8]) -> Vec<u8> {
    input.to_vec()
}

/// Maximal runs of alphanumeric characters and maximal runs of everything
/// else, so that concatenating the tokens restores the text exactly
pub fn tokenize_words(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut current: Option<bool> = None;

    for (i, c) in text.char_indices() {
        let word = c.is_alphanumeric();
        match current {
            Some(kind) if kind == word => {}
            Some(_) => {
                tokens.push(text[start..i].to_string());
                start = i;
                current = Some(word);
            }
            None => current = Some(word),
        }
    }
    if start < text.len() {
        tokens.push(text[start..].to_string());
    }
    tokens
}

/// Inverse of [`tokenize_words`]
pub fn join_words(tokens: &[String]) -> String {
    tokens.concat()
}
