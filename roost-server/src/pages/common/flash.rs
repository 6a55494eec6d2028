use axum_extra::extract::cookie::{Cookie, PrivateCookieJar, SameSite};
use roost_core::config::Configuration;
use roost_core::state::Flash;

/// Append a flash notice to the cookie; the returned jar must ride the
/// response for the write to take effect.
pub fn put_flash(jar: PrivateCookieJar, config: &Configuration, f: Flash) -> PrivateCookieJar {
    trace!("putting flash into cookie");
    let mut flashlist: Vec<Flash> = jar
        .get(&config.flash_cookie)
        .and_then(|cookie| serde_json::from_str(cookie.value()).ok())
        .unwrap_or_default();
    flashlist.push(f);
    match serde_json::to_string(&flashlist) {
        Ok(value) => jar.add(
            Cookie::build(config.flash_cookie.clone(), value)
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .finish(),
        ),
        Err(e) => {
            warn!("could not serialize flash list, dropping it: {}", e);
            jar
        }
    }
}

/// Drop the flash cookie once the notices have been rendered.
pub fn clear_flash(jar: PrivateCookieJar, config: &Configuration) -> PrivateCookieJar {
    if jar.get(&config.flash_cookie).is_none() {
        return jar;
    }
    trace!("draining flash cookie");
    let mut removal = Cookie::named(config.flash_cookie.clone());
    removal.set_path("/");
    jar.remove(removal)
}

#[cfg(test)]
mod test {
    use super::*;
    use axum::http::HeaderMap;
    use axum_extra::extract::cookie::Key;

    fn config() -> Configuration {
        envy::prefixed("ROOST_")
            .from_iter(vec![(
                "ROOST_API_URL".to_string(),
                "https://api.example.com/".to_string(),
            )])
            .unwrap()
    }

    #[test]
    fn flashes_accumulate_in_order() {
        let config = config();
        let jar = PrivateCookieJar::from_headers(&HeaderMap::new(), Key::generate());
        let jar = put_flash(jar, &config, Flash::alert("one"));
        let jar = put_flash(jar, &config, Flash::error("two"));
        let stored: Vec<Flash> =
            serde_json::from_str(jar.get(&config.flash_cookie).unwrap().value()).unwrap();
        assert_eq!(stored, vec![Flash::alert("one"), Flash::error("two")]);
    }

    #[test]
    fn clearing_removes_the_cookie() {
        let config = config();
        let jar = PrivateCookieJar::from_headers(&HeaderMap::new(), Key::generate());
        let jar = put_flash(jar, &config, Flash::info("hello"));
        let jar = clear_flash(jar, &config);
        assert!(jar.get(&config.flash_cookie).is_none());
    }
}
