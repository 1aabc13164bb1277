use reqwest::header::{
    HeaderMap, HeaderValue, InvalidHeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER, USER_AGENT,
};

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

// * Browser identity presented to the statement site.
// * The login form rejects submissions without a realistic User-Agent and Referer.
#[derive(Debug, Clone)]
pub struct IdentityProfile {
    pub chrome_version: &'static str,
    pub user_agent: String,
    pub sec_ch_ua: String,
}

impl IdentityProfile {
    // * Desktop Chrome 120 on Windows.
    pub fn generate_chrome_120() -> Self {
        let major = "120";

        Self {
            chrome_version: major,
            user_agent: format!(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{}.0.6099.109 Safari/537.36",
                major
            ),
            sec_ch_ua: format!(r#""Chromium";v="{0}", "Google Chrome";v="{0}", "Not_A Brand";v="99""#, major),
        }
    }

    // * Page-load headers: UA, client hints, HTML accept.
    pub fn apply_to_headers(&self, headers: &mut HeaderMap) -> Result<(), InvalidHeaderValue> {
        headers.insert(USER_AGENT, HeaderValue::from_str(&self.user_agent)?);
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert("sec-ch-ua", HeaderValue::from_str(&self.sec_ch_ua)?);
        headers.insert("sec-ch-ua-mobile", HeaderValue::from_static("?0"));
        headers.insert("sec-ch-ua-platform", HeaderValue::from_static(r#""Windows""#));
        Ok(())
    }

    // * Form-post headers: page-load headers plus the Referer of the form page.
    pub fn form_headers(&self, referer: &str) -> Result<HeaderMap, InvalidHeaderValue> {
        let mut headers = HeaderMap::new();
        self.apply_to_headers(&mut headers)?;
        headers.insert(REFERER, HeaderValue::from_str(referer)?);
        Ok(headers)
    }
}

impl Default for IdentityProfile {
    fn default() -> Self {
        Self::generate_chrome_120()
    }
}
