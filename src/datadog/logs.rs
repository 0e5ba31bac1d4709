use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Response body of the log search endpoint. Only the fields the relay reads are decoded.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct Response {
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: Vec<Log>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Log {
    #[serde(default, deserialize_with = "null_as_default")]
    pub attributes: LogAttributes,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct LogAttributes {
    /// Custom attributes of the log event
    #[serde(default, deserialize_with = "null_as_default")]
    pub attributes: Map<String, Value>,
}

/// An explicit `null` reads the same as an absent field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_fields_read_as_empty() {
        let response: Response = serde_json::from_value(json!({
            "data": [
                {"attributes": {"attributes": null}},
                {"attributes": null},
                {"attributes": {"attributes": {"msg": "x"}}}
            ]
        }))
        .unwrap();

        assert_eq!(response.data.len(), 3);
        assert!(response.data[0].attributes.attributes.is_empty());
        assert!(response.data[1].attributes.attributes.is_empty());
        assert_eq!(response.data[2].attributes.attributes["msg"], "x");
    }

    #[test]
    fn null_data_reads_as_no_logs() {
        let response: Response = serde_json::from_value(json!({"data": null})).unwrap();

        assert!(response.data.is_empty());
    }
}
