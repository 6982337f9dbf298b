//! Functions for storing the logged in user in private cookies.
//!
//! Two cookies are set on log-in: one holding the user ID and one holding the
//! session expiry. Both are encrypted by the [PrivateCookieJar], so the expiry
//! cannot be tampered with by the client.

use std::cmp::max;

use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use time::{
    Duration, OffsetDateTime, format_description::BorrowedFormatItem,
    macros::format_description,
};

use crate::{Error, auth::UserID};

pub(crate) const COOKIE_USER_ID: &str = "user_id";
pub(crate) const COOKIE_EXPIRY: &str = "expiry";
/// The default duration for which auth cookies are valid.
pub const DEFAULT_COOKIE_DURATION: Duration = Duration::minutes(30);

/// Date time format for the cookie expiry, e.g. "2021-01-01 00:00:00.0 +00:00:00".
const DATE_TIME_FORMAT: &[BorrowedFormatItem] = format_description!(
    "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond] [offset_hour \
         sign:mandatory]:[offset_minute]:[offset_second]"
);

fn build_cookie(name: &'static str, value: String, expiry: OffsetDateTime) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .expires(expiry)
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(true)
        .build()
}

/// Add the auth cookies to `jar`, indicating that `user_id` is logged in.
///
/// The cookies expire `duration` from now.
///
/// # Errors
///
/// Returns an [Error::CookieError] if the expiry time cannot be formatted.
pub fn set_auth_cookie(
    jar: PrivateCookieJar,
    user_id: UserID,
    duration: Duration,
) -> Result<PrivateCookieJar, Error> {
    let expiry = OffsetDateTime::now_utc() + duration;
    // `format` keeps two digit hours at midnight, unlike `to_string`.
    let expiry_string = expiry
        .format(DATE_TIME_FORMAT)
        .map_err(|error| Error::CookieError(error.to_string()))?;

    Ok(jar
        .add(build_cookie(
            COOKIE_USER_ID,
            user_id.as_i64().to_string(),
            expiry,
        ))
        .add(build_cookie(COOKIE_EXPIRY, expiry_string, expiry)))
}

/// Overwrite the auth cookies with expired values so the client discards them.
pub fn invalidate_auth_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    let expire = |name: &'static str| {
        let mut cookie = build_cookie(name, "deleted".to_owned(), OffsetDateTime::UNIX_EPOCH);
        cookie.set_max_age(Duration::ZERO);
        cookie
    };

    jar.add(expire(COOKIE_USER_ID)).add(expire(COOKIE_EXPIRY))
}

/// Get the logged in user's ID from the auth cookies.
///
/// # Errors
///
/// Returns [Error::Unauthorized] if either cookie is missing or malformed, or
/// if the session has expired.
pub fn get_user_id_from_auth_cookie(jar: &PrivateCookieJar) -> Result<UserID, Error> {
    let expiry = get_expiry(jar)?;

    if expiry <= OffsetDateTime::now_utc() {
        return Err(Error::Unauthorized);
    }

    jar.get(COOKIE_USER_ID)
        .and_then(|cookie| cookie.value_trimmed().parse::<i64>().ok())
        .map(UserID::new)
        .ok_or(Error::Unauthorized)
}

/// Push the session expiry out to `duration` from now, unless it already
/// expires later than that.
///
/// # Errors
///
/// The cookie jar is not modified if an error is returned.
/// Returns [Error::Unauthorized] if the auth cookies are missing and
/// [Error::CookieError] if the new expiry cannot be formatted.
pub fn extend_auth_cookie_duration_if_needed(
    jar: PrivateCookieJar,
    duration: Duration,
) -> Result<PrivateCookieJar, Error> {
    let current_expiry = get_expiry(&jar)?;
    let expiry = max(current_expiry, OffsetDateTime::now_utc() + duration);
    let expiry_string = expiry
        .format(DATE_TIME_FORMAT)
        .map_err(|error| Error::CookieError(error.to_string()))?;

    let user_id_cookie = jar.get(COOKIE_USER_ID).ok_or(Error::Unauthorized)?;

    Ok(jar
        .add(build_cookie(
            COOKIE_USER_ID,
            user_id_cookie.value_trimmed().to_owned(),
            expiry,
        ))
        .add(build_cookie(COOKIE_EXPIRY, expiry_string, expiry)))
}

fn get_expiry(jar: &PrivateCookieJar) -> Result<OffsetDateTime, Error> {
    let cookie = jar.get(COOKIE_EXPIRY).ok_or(Error::Unauthorized)?;

    OffsetDateTime::parse(cookie.value_trimmed(), DATE_TIME_FORMAT)
        .map_err(|_| Error::Unauthorized)
}
