//! Common utility functions

pub fn truncate_display(s: &str, max_len: usize) -> String {
    let flat: String = s
        .chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .collect();
    if flat.chars().count() <= max_len {
        flat
    } else {
        format!("{}...", flat.chars().take(max_len).collect::<String>())
    }
}
