use serde::{de::DeserializeOwned, Deserialize, Deserializer};

pub const MAX_PAGE_SIZE: i64 = 10;

// Request body for creating or updating a Todo. `ID` and `created_on` are
// server-owned, so any client copy of them is ignored. Missing or null fields
// take their zero value.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TodoPayload {
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub done: bool,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Decodes the first JSON value in `bytes`; anything after it is ignored.
pub fn decode_body<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, serde_json::Error> {
    serde_json::Deserializer::from_slice(bytes)
        .into_iter::<T>()
        .next()
        // An empty body yields no value at all; let the plain parser word the EOF error.
        .unwrap_or_else(|| serde_json::from_slice(bytes))
}

// Raw `?count=&start=` query. Values stay strings so that garbage falls back
// to the defaults instead of rejecting the request.
#[derive(Debug, Default)]
pub struct PageParams {
    pub count: Option<String>,
    pub start: Option<String>,
}

impl PageParams {
    /// Picks `count` and `start` out of decoded query pairs. A repeated key
    /// keeps its first value.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut params = PageParams::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "count" => &mut params.count,
                "start" => &mut params.start,
                _ => continue,
            };
            slot.get_or_insert(value);
        }
        params
    }

    /// Returns `(start, count)` with `count` in `1..=10` and `start >= 0`.
    pub fn window(&self) -> (i64, i64) {
        let parse = |raw: &Option<String>| {
            raw.as_deref()
                .and_then(|value| value.parse::<i64>().ok())
                .unwrap_or(0)
        };

        let mut count = parse(&self.count);
        let mut start = parse(&self.start);
        if !(1..=MAX_PAGE_SIZE).contains(&count) {
            count = MAX_PAGE_SIZE;
        }
        if start < 0 {
            start = 0;
        }
        (start, count)
    }
}
