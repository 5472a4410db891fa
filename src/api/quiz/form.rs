use std::collections::HashMap;

/// Decoded urlencoded form that preserves repeated keys, which is how the
/// quiz page submits multi-answer questions.
#[derive(Debug, Default)]
pub(in crate::api::quiz) struct FormMultiMap {
    fields: HashMap<String, Vec<String>>,
}

impl FormMultiMap {
    pub(in crate::api::quiz) fn parse(body: &[u8]) -> Self {
        let mut fields: HashMap<String, Vec<String>> = HashMap::new();
        for (key, value) in url::form_urlencoded::parse(body) {
            fields.entry(key.into_owned()).or_default().push(value.into_owned());
        }
        Self { fields }
    }

    pub(in crate::api::quiz) fn all(&self, key: &str) -> &[String] {
        self.fields.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    pub(in crate::api::quiz) fn first(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(|values| values.first()).map(String::as_str)
    }
}
