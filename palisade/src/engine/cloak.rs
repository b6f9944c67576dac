// palisade/src/engine/cloak.rs
//
// Response policy selector: maps the assessed risk band to a masking body.
// Every masking page is static markup with no reference to the request that
// triggered it. The redirect destination is drawn fresh per call from the
// configured legitimate-site list, never cached.

use bytes::Bytes;
use rand::seq::IndexedRandom;

use crate::events::{RiskAssessment, RiskBand};

pub(crate) fn select_response(
    assessment: &RiskAssessment,
    original: Bytes,
    destinations: &[String],
    enabled: bool,
) -> Bytes {
    if !enabled {
        return original;
    }
    match assessment.band() {
        RiskBand::Low => original,
        RiskBand::Moderate => Bytes::from_static(LANDING_PAGE.as_bytes()),
        RiskBand::Elevated => Bytes::from(redirect_page(destinations)),
        RiskBand::High => Bytes::from_static(MAINTENANCE_PAGE.as_bytes()),
        RiskBand::Critical => Bytes::from_static(NOT_FOUND_PAGE.as_bytes()),
    }
}

fn redirect_page(destinations: &[String]) -> String {
    let fallback = "https://www.example.com".to_string();
    let destination = destinations.choose(&mut rand::rng()).unwrap_or(&fallback);
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Redirecting...</title>
    <meta http-equiv="refresh" content="3;url={destination}">
    <style>
        body {{ font-family: Arial, sans-serif; text-align: center; padding: 50px; }}
    </style>
</head>
<body>
    <h2>Redirecting...</h2>
    <p>If you are not redirected automatically, <a href="{destination}">click here</a>.</p>
</body>
</html>
"#
    )
}

const NOT_FOUND_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>404 - Page Not Found</title>
    <style>
        body { font-family: Arial, sans-serif; text-align: center; padding: 50px; }
        h1 { color: #333; }
        p { color: #666; }
    </style>
</head>
<body>
    <h1>404 - Page Not Found</h1>
    <p>The page you are looking for might have been removed, had its name changed,
       or is temporarily unavailable.</p>
    <p><a href="/">Go back to homepage</a></p>
</body>
</html>
"#;

const MAINTENANCE_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Site Maintenance</title>
    <style>
        body { font-family: Arial, sans-serif; text-align: center; padding: 50px; background: #f5f5f5; }
        .container { max-width: 600px; margin: 0 auto; background: white; padding: 40px; border-radius: 10px; }
    </style>
</head>
<body>
    <div class="container">
        <h1>Site Under Maintenance</h1>
        <p>We're currently performing scheduled maintenance to improve your experience.</p>
        <p>Please check back in a few hours. Thank you for your patience!</p>
    </div>
</body>
</html>
"#;

const LANDING_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Welcome</title>
    <style>
        body { font-family: Arial, sans-serif; margin: 0; padding: 0; }
        .container { max-width: 800px; margin: 0 auto; padding: 100px 20px; text-align: center; }
    </style>
</head>
<body>
    <div class="container">
        <h1>Welcome</h1>
        <p>This site is currently being developed. Please check back soon for updates.</p>
    </div>
</body>
</html>
"#;
