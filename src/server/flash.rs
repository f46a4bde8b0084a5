use std::convert::Infallible;
use std::fmt;

use axum::{
    async_trait,
    extract::{FromRequest, RequestParts},
    http::{
        header::{COOKIE, SET_COOKIE},
        HeaderValue,
    },
    response::{IntoResponse, Redirect, Response},
};
use url::form_urlencoded;

use crate::server::ServerError;

const COOKIE_NAME: &str = "flash";

const EXPIRED: &str = "flash=; Path=/; Max-Age=0";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Error,
}

impl Level {
    fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(self.as_str())
    }
}

/// One-time status message shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub level: Level,
    pub message: String,
}

impl Flash {
    pub fn success(message: &str) -> Self {
        Self {
            level: Level::Success,
            message: message.to_owned(),
        }
    }

    pub fn error(message: &str) -> Self {
        Self {
            level: Level::Error,
            message: message.to_owned(),
        }
    }

    /// Redirects with `303 See Other`, carrying the message in a cookie.
    pub fn redirect(&self, to: &str) -> Result<Response, ServerError> {
        let cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax",
            COOKIE_NAME,
            self.encode()
        );

        let mut resp = Redirect::to(to).into_response();

        resp.headers_mut()
            .insert(SET_COOKIE, HeaderValue::from_str(&cookie)?);

        Ok(resp)
    }

    fn encode(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .append_pair("level", self.level.as_str())
            .append_pair("message", &self.message)
            .finish()
    }

    fn decode(val: &str) -> Option<Self> {
        let mut level = None;
        let mut message = None;

        for (key, val) in form_urlencoded::parse(val.as_bytes()) {
            match &*key {
                "level" => {
                    level = match &*val {
                        "success" => Some(Level::Success),
                        "error" => Some(Level::Error),
                        _ => None,
                    }
                }
                "message" => message = Some(val.into_owned()),
                _ => (),
            }
        }

        Some(Self {
            level: level?,
            message: message?,
        })
    }
}

/// Message left behind by the previous response, if any.
#[derive(Debug, Default)]
pub struct IncomingFlash(Option<Flash>);

impl IncomingFlash {
    pub fn messages(&self) -> Vec<Flash> {
        self.0.iter().cloned().collect()
    }

    /// Expires the cookie once its message has been rendered.
    pub fn finish(self, page: impl IntoResponse) -> Response {
        let mut resp = page.into_response();

        if self.0.is_some() {
            resp.headers_mut()
                .append(SET_COOKIE, HeaderValue::from_static(EXPIRED));
        }

        resp
    }

    fn parse(header: &str) -> Option<Flash> {
        header
            .split(';')
            .filter_map(|pair| pair.trim().strip_prefix(COOKIE_NAME)?.strip_prefix('='))
            .find_map(Flash::decode)
    }
}

#[async_trait]
impl<B> FromRequest<B> for IncomingFlash
where
    B: Send,
{
    type Rejection = Infallible;

    async fn from_request(req: &mut RequestParts<B>) -> Result<Self, Self::Rejection> {
        let flash = req
            .headers()
            .get_all(COOKIE)
            .iter()
            .filter_map(|header| header.to_str().ok())
            .find_map(Self::parse);

        Ok(Self(flash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::http::StatusCode;

    #[test]
    fn cookie_carries_message() {
        let resp = Flash::success("Contact added successfully!")
            .redirect("/contacts")
            .unwrap();

        assert_eq!(resp.status(), StatusCode::SEE_OTHER);

        let cookie = resp.headers()[SET_COOKIE].to_str().unwrap();
        let val = cookie.strip_prefix("flash=").unwrap().split(';').next().unwrap();

        assert_eq!(
            Flash::decode(val),
            Some(Flash::success("Contact added successfully!"))
        );
    }

    #[test]
    fn parse_finds_flash_among_other_cookies() {
        let header = "theme=dark; flash=level=error&message=Error+deleting+contact.; lang=en";

        assert_eq!(
            IncomingFlash::parse(header),
            Some(Flash::error("Error deleting contact."))
        );
    }

    #[test]
    fn parse_ignores_expired_and_foreign_cookies() {
        assert_eq!(IncomingFlash::parse("flash="), None);
        assert_eq!(IncomingFlash::parse("flashy=level=success&message=x"), None);
        assert_eq!(IncomingFlash::parse("flash=level=bogus&message=x"), None);
    }

    #[test]
    fn finish_expires_only_consumed_cookies() {
        let resp = IncomingFlash(Some(Flash::success("ok"))).finish("page");
        assert_eq!(resp.headers()[SET_COOKIE], EXPIRED);

        let resp = IncomingFlash::default().finish("page");
        assert!(resp.headers().get(SET_COOKIE).is_none());
    }
}
