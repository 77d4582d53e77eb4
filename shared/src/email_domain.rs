//! Email-domain matching used to pre-verify agency claims

/// Consumer mailbox providers; an address there proves nothing about
/// ownership of a company website.
const FREE_MAIL_PROVIDERS: &[&str] = &[
    "gmail.com",
    "googlemail.com",
    "yahoo.com",
    "hotmail.com",
    "outlook.com",
    "aol.com",
    "icloud.com",
    "protonmail.com",
    "live.com",
    "msn.com",
    "gmx.com",
];

/// Lowercased domain of an email address.
pub fn email_domain(email: &str) -> Option<String> {
    let (_, domain) = email.trim().rsplit_once('@')?;
    let domain = domain.trim().trim_end_matches('.').to_lowercase();
    if domain.is_empty() || !domain.contains('.') {
        return None;
    }
    Some(domain)
}

/// Host of a website URL, lowercased, without scheme, `www.`, port, path or query.
///
/// Accepts bare hosts such as `"acme.com/about"`.
pub fn website_domain(url: &str) -> Option<String> {
    let url = url.trim();
    let without_scheme = match url.find("://") {
        Some(idx) => &url[idx + 3..],
        None => url,
    };
    let host = without_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();
    // userinfo@host
    let host = host.rsplit('@').next().unwrap_or(host);
    let host = host.split(':').next().unwrap_or(host);
    let host = host.trim_end_matches('.').to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host).to_string();

    if host.is_empty() || !host.contains('.') {
        return None;
    }
    Some(host)
}

/// Whether the address is hosted by a consumer mailbox provider.
pub fn is_free_mail(domain: &str) -> bool {
    FREE_MAIL_PROVIDERS.contains(&domain)
}

/// True when the email's domain is the website's domain or a subdomain of it.
pub fn email_matches_website(email: &str, website: &str) -> bool {
    let (Some(email_dom), Some(site_dom)) = (email_domain(email), website_domain(website)) else {
        return false;
    };
    if is_free_mail(&email_dom) {
        return false;
    }
    email_dom == site_dom || email_dom.ends_with(&format!(".{site_dom}"))
}
