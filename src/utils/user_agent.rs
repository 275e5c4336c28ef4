//! Device classification from the `User-Agent` header.

use woothee::parser::Parser;

use crate::domain::entities::DeviceType;

/// woothee has no tablet category and reports tablets as smartphones.
const TABLET_MARKERS: &[&str] = &["ipad", "tablet", "kindle", "silk/", "playbook"];

/// Classifies a user agent string into a [`DeviceType`].
///
/// Tablets are detected first from well-known markers (`Android` without
/// `Mobile` is a tablet by convention). woothee's `smartphone` and
/// `mobilephone` categories map to mobile; every other agent, including
/// crawlers and HTTP libraries, counts as desktop. Returns `None` for empty
/// agents.
pub fn classify_user_agent(user_agent: &str) -> Option<DeviceType> {
    let ua = user_agent.trim();
    if ua.is_empty() {
        return None;
    }

    let lower = ua.to_ascii_lowercase();
    if TABLET_MARKERS.iter().any(|m| lower.contains(m))
        || (lower.contains("android") && !lower.contains("mobile"))
    {
        return Some(DeviceType::Tablet);
    }

    let category = Parser::new().parse(ua).map(|r| r.category).unwrap_or_default();
    match category {
        "smartphone" | "mobilephone" => Some(DeviceType::Mobile),
        _ => Some(DeviceType::Desktop),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_desktop_agents() {
        let chrome = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";
        assert_eq!(classify_user_agent(chrome), Some(DeviceType::Desktop));
        assert_eq!(classify_user_agent("curl/8.4.0"), Some(DeviceType::Desktop));
    }

    #[test]
    fn test_mobile_agents() {
        let iphone = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";
        let android_phone = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Mobile Safari/537.36";

        assert_eq!(classify_user_agent(iphone), Some(DeviceType::Mobile));
        assert_eq!(classify_user_agent(android_phone), Some(DeviceType::Mobile));
    }

    #[test]
    fn test_tablet_agents() {
        let ipad = "Mozilla/5.0 (iPad; CPU OS 17_0 like Mac OS X) AppleWebKit/605.1.15 Mobile/15E148";
        let android_tablet =
            "Mozilla/5.0 (Linux; Android 13; SM-X700) AppleWebKit/537.36 Chrome/120.0 Safari/537.36";

        assert_eq!(classify_user_agent(ipad), Some(DeviceType::Tablet));
        assert_eq!(classify_user_agent(android_tablet), Some(DeviceType::Tablet));
    }

    #[test]
    fn test_empty_agent() {
        assert_eq!(classify_user_agent(""), None);
        assert_eq!(classify_user_agent("   "), None);
    }
}
