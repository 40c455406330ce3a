use serde::{Deserialize, Deserializer};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreateTodoForm {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTodoForm {
    pub id: Uuid,
    pub title: Option<String>,
    /// Accepts `true`/`false` as well as an HTML checkbox's `on`.
    #[serde(default, deserialize_with = "checkbox")]
    pub completed: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteTodoForm {
    pub id: Uuid,
}

fn checkbox<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some("true" | "on" | "1") => Ok(Some(true)),
        Some("false" | "off" | "0") => Ok(Some(false)),
        Some(other) => Err(serde::de::Error::invalid_value(
            serde::de::Unexpected::Str(other),
            &"a checkbox value",
        )),
    }
}
