/// A successful provider response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Answer {
    /// The model produced text.
    Text(String),
    /// The response was valid but carried no usable text payload.
    Empty,
}

impl Answer {
    /// `Empty` when the text is blank, otherwise `Text`.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.trim().is_empty() {
            Answer::Empty
        } else {
            Answer::Text(text)
        }
    }
}
