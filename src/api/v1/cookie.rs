use crate::application_port::RefreshToken;

pub const REFRESH_COOKIE: &str = "refreshToken";

/// Attributes of the refresh-token cookie. It is never readable from page
/// scripts and is only sent on same-site requests.
#[derive(Debug, Clone)]
pub struct RefreshCookie {
    pub secure: bool,
    pub max_age_secs: u64,
}

impl RefreshCookie {
    pub fn issue(&self, token: &RefreshToken) -> String {
        format!(
            "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Strict{}",
            REFRESH_COOKIE,
            token.as_str(),
            self.max_age_secs,
            self.secure_attr()
        )
    }

    pub fn clear(&self) -> String {
        format!(
            "{}=; Path=/; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT; HttpOnly; SameSite=Strict{}",
            REFRESH_COOKIE,
            self.secure_attr()
        )
    }

    fn secure_attr(&self) -> &'static str {
        if self.secure { "; Secure" } else { "" }
    }
}
