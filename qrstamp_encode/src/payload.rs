//! Formatters for structured payloads that phone readers understand, and a rough classifier for
//! free text.

use std::fmt::Display;
use std::str::FromStr;

use itertools::Itertools;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Authentication of a WiFi network.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WifiSecurity {
    #[default]
    Wpa,
    Wep,
    NoPass,
}

impl Display for WifiSecurity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            WifiSecurity::Wpa => "WPA",
            WifiSecurity::Wep => "WEP",
            WifiSecurity::NoPass => "nopass",
        };
        write!(f, "{}", label)
    }
}

impl FromStr for WifiSecurity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "wpa" => Ok(WifiSecurity::Wpa),
            "wep" => Ok(WifiSecurity::Wep),
            "nopass" => Ok(WifiSecurity::NoPass),
            _ => Err(format!("unknown WiFi security '{}', expected WPA, WEP or nopass", s)),
        }
    }
}

/// Join a WiFi network.
/// # Example
/// ```
/// use qrstamp_encode::payload::{wifi, WifiSecurity};
/// assert_eq!(wifi("Net", Some("pass"), WifiSecurity::Wpa), "WIFI:S:Net;T:WPA;P:pass;");
/// assert_eq!(wifi("Cafe", Some("ignored"), WifiSecurity::NoPass), "WIFI:S:Cafe;T:nopass;;");
/// ```
pub fn wifi(ssid: &str, password: Option<&str>, security: WifiSecurity) -> String {
    match security {
        WifiSecurity::NoPass => format!("WIFI:S:{};T:nopass;;", ssid),
        _ => format!(
            "WIFI:S:{};T:{};P:{};",
            ssid,
            security,
            password.unwrap_or_default()
        ),
    }
}

/// A contact card, formatted as vCard 3.0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Contact {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub website: Option<String>,
}

impl Contact {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn to_vcard(&self) -> String {
        let mut lines = vec![
            "BEGIN:VCARD".to_string(),
            "VERSION:3.0".to_string(),
            format!("N:{}", self.name),
            format!("FN:{}", self.name),
        ];
        let optional = [
            ("ORG", &self.company),
            ("TITLE", &self.job_title),
            ("TEL", &self.phone),
            ("EMAIL", &self.email),
            ("URL", &self.website),
        ];
        for (key, value) in optional {
            if let Some(value) = value.as_deref().filter(|value| !value.is_empty()) {
                lines.push(format!("{}:{}", key, value));
            }
        }
        lines.push("END:VCARD".to_string());
        lines.join("\n")
    }
}

/// Everything but RFC 3986 unreserved characters is escaped in mailto fields.
const MAILTO_FIELD: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

/// Compose an e-mail.
/// # Example
/// ```
/// use qrstamp_encode::payload::email;
/// assert_eq!(email("a@b.io", Some("Hi there"), None), "mailto:a@b.io?subject=Hi%20there");
/// assert_eq!(email("a@b.io", None, None), "mailto:a@b.io");
/// ```
pub fn email(to: &str, subject: Option<&str>, body: Option<&str>) -> String {
    let query = [("subject", subject), ("body", body)]
        .into_iter()
        .filter_map(|(key, value)| {
            value
                .filter(|value| !value.is_empty())
                .map(|value| format!("{}={}", key, utf8_percent_encode(value, MAILTO_FIELD)))
        })
        .join("&");
    if query.is_empty() {
        format!("mailto:{}", to)
    } else {
        format!("mailto:{}?{}", to, query)
    }
}

/// A location, as latitude and longitude in degrees.
pub fn geo(latitude: f64, longitude: f64) -> String {
    format!("geo:{},{}", latitude, longitude)
}

/// A calendar event, formatted as an iCalendar VEVENT. Dates are passed through as given, e.g.
/// `20250131T090000Z`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Event {
    pub summary: String,
    pub start: String,
    pub end: String,
    pub location: Option<String>,
    pub description: Option<String>,
}

impl Event {
    pub fn new(summary: impl Into<String>, start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            start: start.into(),
            end: end.into(),
            ..Default::default()
        }
    }

    pub fn to_vevent(&self) -> String {
        let mut lines = vec![
            "BEGIN:VEVENT".to_string(),
            format!("SUMMARY:{}", self.summary),
            format!("DTSTART:{}", self.start),
            format!("DTEND:{}", self.end),
        ];
        for (key, value) in [("LOCATION", &self.location), ("DESCRIPTION", &self.description)] {
            if let Some(value) = value.as_deref().filter(|value| !value.is_empty()) {
                lines.push(format!("{}:{}", key, value));
            }
        }
        lines.push("END:VEVENT".to_string());
        lines.join("\n")
    }
}

/// What a piece of free text looks like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Url,
    Email,
    Phone,
    Text,
}

impl Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ContentType::Url => "url",
            ContentType::Email => "email",
            ContentType::Phone => "phone",
            ContentType::Text => "text",
        };
        write!(f, "{}", label)
    }
}

/// Classify `text`. URLs win over e-mail addresses, which win over phone numbers.
/// # Example
/// ```
/// use qrstamp_encode::payload::{detect_content_type, ContentType};
/// assert_eq!(detect_content_type("https://example.com"), ContentType::Url);
/// assert_eq!(detect_content_type("jane@example.com"), ContentType::Email);
/// assert_eq!(detect_content_type("+1 (555) 123-4567"), ContentType::Phone);
/// assert_eq!(detect_content_type("hello"), ContentType::Text);
/// ```
pub fn detect_content_type(text: &str) -> ContentType {
    if is_url(text) {
        ContentType::Url
    } else if is_email(text) {
        ContentType::Email
    } else if is_phone(text) {
        ContentType::Phone
    } else {
        ContentType::Text
    }
}

/// A scheme followed by `//` and a non-empty authority.
fn is_url(text: &str) -> bool {
    let Some((scheme, rest)) = text.split_once(':') else {
        return false;
    };
    let scheme_ok = scheme.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    let authority = rest
        .strip_prefix("//")
        .map(|rest| rest.split(['/', '?', '#']).next().unwrap_or_default());
    scheme_ok && authority.is_some_and(|authority| !authority.is_empty())
}

fn is_email(text: &str) -> bool {
    let Some((local, domain)) = text.split_once('@') else {
        return false;
    };
    let local_ok = !local.is_empty()
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '%' | '+' | '-'));
    let domain_ok = domain.rsplit_once('.').is_some_and(|(host, tld)| {
        !host.is_empty()
            && host
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-'))
            && tld.len() >= 2
            && tld.chars().all(|c| c.is_ascii_alphabetic())
    });
    local_ok && domain_ok
}

/// An optional `+` and at least seven digits, blanks, dashes or parentheses.
fn is_phone(text: &str) -> bool {
    let rest = text.strip_prefix('+').unwrap_or(text);
    rest.chars().count() >= 7
        && rest
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_whitespace() || matches!(c, '-' | '(' | ')'))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_wifi() {
        assert_eq!(wifi("Net", None, WifiSecurity::Wep), "WIFI:S:Net;T:WEP;P:;");
        assert_eq!("WPA".parse(), Ok(WifiSecurity::Wpa));
        assert_eq!("NoPass".parse(), Ok(WifiSecurity::NoPass));
        assert!("wpa3".parse::<WifiSecurity>().is_err());
    }

    #[test]
    fn test_vcard() {
        let mut contact = Contact::new("Jane Doe");
        contact.phone = Some("+1 555 0100".into());
        contact.company = Some("Acme".into());
        contact.website = Some(String::new());
        assert_eq!(
            contact.to_vcard(),
            "BEGIN:VCARD\nVERSION:3.0\nN:Jane Doe\nFN:Jane Doe\nORG:Acme\nTEL:+1 555 0100\nEND:VCARD"
        );
    }

    #[test]
    fn test_email_encoding() {
        assert_eq!(
            email("a@b.io", Some("Q&A"), Some("line 1\nçava")),
            "mailto:a@b.io?subject=Q%26A&body=line%201%0A%C3%A7ava"
        );
        assert_eq!(email("a@b.io", Some(""), Some("x")), "mailto:a@b.io?body=x");
        assert_eq!(
            email("a@b.io", Some("a-b.c_d~e!*'()+="), None),
            "mailto:a@b.io?subject=a-b.c_d~e%21%2A%27%28%29%2B%3D"
        );
    }

    #[test]
    fn test_geo() {
        assert_eq!(geo(48.8584, 2.2945), "geo:48.8584,2.2945");
        assert_eq!(geo(-33.5, 0.0), "geo:-33.5,0");
    }

    #[test]
    fn test_event() {
        let mut event = Event::new("Launch", "20250131T090000Z", "20250131T100000Z");
        event.location = Some("Room 4".into());
        assert_eq!(
            event.to_vevent(),
            "BEGIN:VEVENT\nSUMMARY:Launch\nDTSTART:20250131T090000Z\nDTEND:20250131T100000Z\nLOCATION:Room 4\nEND:VEVENT"
        );
    }

    #[test]
    fn test_detect_content_type() {
        assert_eq!(detect_content_type("ftp://files.example.org/a"), ContentType::Url);
        assert_eq!(detect_content_type("http://"), ContentType::Text);
        assert_eq!(detect_content_type("example.com"), ContentType::Text);
        assert_eq!(detect_content_type("mailto:a@b.io"), ContentType::Text);
        assert_eq!(detect_content_type("a.b+c@mail.example.co"), ContentType::Email);
        assert_eq!(detect_content_type("a@b.c"), ContentType::Text);
        assert_eq!(detect_content_type("a@@b.io"), ContentType::Text);
        assert_eq!(detect_content_type("555-0100"), ContentType::Phone);
        assert_eq!(detect_content_type("555-01"), ContentType::Text);
        assert_eq!(detect_content_type("WIFI:S:Net;T:WPA;P:pass;"), ContentType::Text);
    }
}
