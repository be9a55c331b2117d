use serde::Deserialize;

/// Configuration knobs for [`TreeStore`](crate::TreeStore) behaviour.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TreeOptions {
    /// Notify subscribers after a delete whose target was not found.
    ///
    /// Consumers that refresh their view on every delete rely on this.
    pub notify_on_miss: bool,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            notify_on_miss: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_empty_json_when_parsed_then_defaults_apply() {
        let options: TreeOptions =
            serde_json::from_str("{}").expect("should parse");
        assert_eq!(options, TreeOptions::default());
        assert!(options.notify_on_miss);
    }
}
