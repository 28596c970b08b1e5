use crate::browser::{xpath, Browser, BrowserError, Element, Page, Role, Strategy};
use crate::config::BrowserConfig;
use async_trait::async_trait;
use fantoccini::elements::Element as WdElement;
use fantoccini::error::{CmdError, NewSessionError};
use fantoccini::wd::{Capabilities, WindowHandle};
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::json;

impl From<CmdError> for BrowserError {
    fn from(error: CmdError) -> Self {
        let message = error.to_string();
        if message.contains("stale element") {
            BrowserError::Stale
        } else {
            BrowserError::Command(message)
        }
    }
}

impl From<NewSessionError> for BrowserError {
    fn from(error: NewSessionError) -> Self {
        BrowserError::Connect(error.to_string())
    }
}

/// WebDriver session driving one Chrome profile
pub struct WebBrowser {
    client: Client,
    main_window: WindowHandle,
}

impl WebBrowser {
    /// Starts a WebDriver session with the profile and window settings from `config`
    pub async fn connect(config: &BrowserConfig) -> Result<Self, BrowserError> {
        let client = connect_to_webdriver(&config.webdriver_url, chrome_capabilities(config))
            .await
            .ok_or_else(|| BrowserError::Connect(config.webdriver_url.clone()))?;

        if let Err(e) = client
            .set_window_size(config.window_width, config.window_height)
            .await
        {
            ::log::debug!("Could not resize browser window: {}", e);
        }

        let main_window = client.window().await?;
        Ok(Self {
            client,
            main_window,
        })
    }

    /// The tab the session started with. Closing it is a no-op.
    pub fn main_page(&self) -> WebPage {
        WebPage {
            client: self.client.clone(),
            handle: self.main_window.clone(),
            opener: None,
        }
    }

    /// Ends the WebDriver session
    pub async fn shutdown(self) {
        if let Err(e) = self.client.close().await {
            ::log::warn!("Failed to close WebDriver session: {}", e);
        }
    }
}

#[async_trait]
impl Browser for WebBrowser {
    type Page = WebPage;

    async fn open_page(&self) -> Result<WebPage, BrowserError> {
        let opener = self.client.window().await?;
        let window = self.client.new_window(true).await?;
        self.client.switch_to_window(window.handle.clone()).await?;
        ::log::trace!("Opened tab {:?}", window.handle);

        Ok(WebPage {
            client: self.client.clone(),
            handle: window.handle,
            opener: Some(opener),
        })
    }
}

/// Builds the capabilities for a Chrome session bound to a persistent profile
fn chrome_capabilities(config: &BrowserConfig) -> Capabilities {
    let mut args = vec![
        format!("--user-data-dir={}", config.persist_dir),
        "--start-maximized".to_string(),
    ];
    if config.headless {
        args.push("--headless=new".to_string());
    }

    let mut caps = Capabilities::new();
    caps.insert("browserName".to_string(), json!("chrome"));
    caps.insert("goog:chromeOptions".to_string(), json!({ "args": args }));
    caps
}

/// Connects to the WebDriver instance
async fn connect_to_webdriver(webdriver_url: &str, caps: Capabilities) -> Option<Client> {
    match ClientBuilder::native()
        .capabilities(caps.clone())
        .connect(webdriver_url)
        .await
    {
        Ok(client) => {
            ::log::debug!("Connected to WebDriver at {}", webdriver_url);
            return Some(client);
        }
        Err(e) => {
            ::log::error!(
                "Failed to connect to WebDriver at {}: {}",
                webdriver_url,
                e
            );
        }
    }

    let fallback_urls = [
        "http://localhost:9515", // ChromeDriver default
        "http://localhost:4444", // Selenium / geckodriver default
        "http://127.0.0.1:4444",
    ];

    for url in fallback_urls.iter() {
        if *url == webdriver_url {
            continue;
        }

        ::log::info!("Trying fallback WebDriver URL: {}", url);
        if let Ok(client) = ClientBuilder::native()
            .capabilities(caps.clone())
            .connect(url)
            .await
        {
            ::log::debug!("Connected to fallback WebDriver at {}", url);
            return Some(client);
        }
    }

    ::log::error!(
        "Make sure a WebDriver server is running or set the WEBDRIVER_URL environment variable"
    );
    None
}

/// Translates a strategy into a WebDriver locator expression.
///
/// Returns `(is_css, expression)`. Text and role strategies become XPath.
fn locator_expr(strategy: &Strategy, scoped: bool) -> (bool, String) {
    let expr = match strategy {
        Strategy::Css(css) => return (true, css.clone()),
        Strategy::XPath(expr) => expr.clone(),
        Strategy::Text(phrase) => {
            format!("//*[text()[{}]]", xpath::contains_folded(".", phrase))
        }
        Strategy::Role(role, label) => {
            let (tag, aria) = match role {
                Role::Button => ("button", "button"),
                Role::Link => ("a", "link"),
            };
            let label_test = xpath::contains_folded("normalize-space(.)", label);
            format!(
                "//{tag}[{test}] | //*[@role=\"{aria}\"][{test}]",
                tag = tag,
                aria = aria,
                test = label_test
            )
        }
    };

    if scoped {
        (false, xpath::relative(&expr))
    } else {
        (false, expr)
    }
}

/// One tab of a [`WebBrowser`] session
pub struct WebPage {
    client: Client,
    handle: WindowHandle,
    opener: Option<WindowHandle>,
}

#[async_trait]
impl Page for WebPage {
    type Element = WebElement;

    async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        self.client.goto(url).await?;
        Ok(())
    }

    async fn find_all(
        &self,
        strategy: &Strategy,
        within: Option<&WebElement>,
    ) -> Result<Vec<WebElement>, BrowserError> {
        let (is_css, expr) = locator_expr(strategy, within.is_some());
        let locator = if is_css {
            Locator::Css(&expr)
        } else {
            Locator::XPath(&expr)
        };

        let found = match within {
            Some(parent) => parent.inner.find_all(locator).await?,
            None => self.client.find_all(locator).await?,
        };

        Ok(found
            .into_iter()
            .map(|inner| WebElement {
                inner,
                client: self.client.clone(),
            })
            .collect())
    }

    async fn title(&self) -> Result<String, BrowserError> {
        Ok(self.client.title().await?)
    }

    async fn source(&self) -> Result<String, BrowserError> {
        Ok(self.client.source().await?)
    }

    async fn screenshot(&self) -> Result<Vec<u8>, BrowserError> {
        Ok(self.client.screenshot().await?)
    }

    async fn close(&self) -> Result<(), BrowserError> {
        let Some(opener) = &self.opener else {
            return Ok(());
        };

        self.client.switch_to_window(self.handle.clone()).await?;
        self.client.close_window().await?;
        self.client.switch_to_window(opener.clone()).await?;
        Ok(())
    }
}

/// Element handle bound to the session that found it
#[derive(Clone)]
pub struct WebElement {
    inner: WdElement,
    client: Client,
}

impl WebElement {
    async fn run_script(&self, script: &str) -> Result<(), BrowserError> {
        let arg = serde_json::to_value(&self.inner)
            .map_err(|e| BrowserError::Command(e.to_string()))?;
        self.client.execute(script, vec![arg]).await?;
        Ok(())
    }
}

#[async_trait]
impl Element for WebElement {
    async fn is_visible(&self) -> Result<bool, BrowserError> {
        Ok(self.inner.is_displayed().await?)
    }

    async fn attr(&self, name: &str) -> Result<Option<String>, BrowserError> {
        Ok(self.inner.attr(name).await?)
    }

    async fn text(&self) -> Result<String, BrowserError> {
        Ok(self.inner.text().await?)
    }

    async fn value(&self) -> Result<String, BrowserError> {
        Ok(self.inner.prop("value").await?.unwrap_or_default())
    }

    async fn is_checked(&self) -> Result<bool, BrowserError> {
        Ok(self.inner.is_selected().await?)
    }

    async fn click(&self) -> Result<(), BrowserError> {
        self.inner.click().await?;
        Ok(())
    }

    async fn force_click(&self) -> Result<(), BrowserError> {
        self.run_script("arguments[0].click();").await
    }

    async fn fill(&self, text: &str) -> Result<(), BrowserError> {
        self.inner.clear().await?;
        self.inner.send_keys(text).await?;
        Ok(())
    }

    async fn scroll_into_view(&self) -> Result<(), BrowserError> {
        self.run_script("arguments[0].scrollIntoView({block: 'center', inline: 'nearest'});")
            .await
    }
}
