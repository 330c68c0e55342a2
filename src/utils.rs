use chrono::{DateTime, SecondsFormat, Utc};
use rocket::http::Status;
use rocket::request::Request;
use rocket::response::{self, Responder, Response};
use rocket::serde::json::Json;
use serde::Serializer;
use serde_json::Value;

pub fn try_respond(req: &Request, json: &Value, status: Status) -> response::Result<'static> {
    let response = Json(json).respond_to(req)?;
    Response::build_from(response).status(status).ok()
}

pub fn serialize_date<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let s = date.to_rfc3339_opts(SecondsFormat::Millis, true);
    serializer.serialize_str(&s)
}

/// Keeps the first occurrence of every tag, dropping blanks.
pub fn dedup_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_string();
        if !tag.is_empty() && !seen.contains(&tag) {
            seen.push(tag);
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[derive(Serialize)]
    struct Stamp {
        #[serde(serialize_with = "serialize_date")]
        at: DateTime<Utc>,
    }

    #[test]
    fn dates_have_millisecond_precision() {
        let at = Utc.with_ymd_and_hms(2016, 2, 18, 3, 22, 56).unwrap();
        let json = serde_json::to_string(&Stamp { at }).unwrap();
        assert_eq!(json, r#"{"at":"2016-02-18T03:22:56.000Z"}"#);
    }

    #[test]
    fn tags_keep_first_occurrence() {
        let tags = vec!["rust", "web", " rust", "", "api", "web"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(dedup_tags(tags), vec!["rust", "web", "api"]);
    }
}
