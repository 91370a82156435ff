use std::{collections::BTreeMap, fmt};

pub mod fields {
    pub const SENDER: &str = "sender";
    pub const RECIPIENT: &str = "recipient";
    pub const AMOUNT: &str = "amount";
    pub const PRIVATE_KEY: &str = "private_key";
    pub const TARGET: &str = "target";
    pub const LEVEL: &str = "level";
    pub const DATA_ID: &str = "data_id";
    pub const CONTENT: &str = "content";

    pub const ALL: [&str; 8] = [
        SENDER,
        RECIPIENT,
        AMOUNT,
        PRIVATE_KEY,
        TARGET,
        LEVEL,
        DATA_ID,
        CONTENT,
    ];

    pub fn is_secret(name: &str) -> bool {
        name == PRIVATE_KEY
    }
}

/// In-progress operator input, keyed by field name.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct FormState {
    values: BTreeMap<String, String>,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets one field; every other field is left as it was.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.values.remove(name)
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Debug for FormState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (name, value) in self.iter() {
            if fields::is_secret(name) {
                map.entry(&name, &"<redacted>");
            } else {
                map.entry(&name, &value);
            }
        }
        map.finish()
    }
}
