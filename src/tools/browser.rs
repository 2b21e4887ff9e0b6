//! Browser automation tool
//!
//! Drives a headless Chrome over the DevTools protocol. Only available with
//! the `browser` cargo feature; without it [`BrowserTool::new`] fails with
//! install instructions.

use super::not_installed::NotInstalled;

/// The stand-in used when the browser feature is missing
pub fn browser_not_installed() -> NotInstalled {
    NotInstalled::new("browser", "browser")
        .with_instructions("Chrome or Chromium must also be available on PATH")
}

#[cfg(not(feature = "browser"))]
mod disabled {
    use anyhow::Result;
    use async_trait::async_trait;
    use serde_json::Value;

    use crate::llm::ToolDefinition;
    use crate::tools::tool::{Tool, ToolContext, ToolResult};

    /// Browser tool (not compiled in)
    #[derive(Debug)]
    pub enum BrowserTool {}

    impl BrowserTool {
        pub fn new() -> Result<Self> {
            Err(super::browser_not_installed().error().into())
        }
    }

    #[async_trait]
    impl Tool for BrowserTool {
        fn name(&self) -> &str {
            match *self {}
        }

        fn description(&self) -> &str {
            match *self {}
        }

        fn definition(&self) -> ToolDefinition {
            match *self {}
        }

        async fn execute(&self, _input: &Value, _ctx: &ToolContext<'_>) -> Result<ToolResult> {
            match *self {}
        }
    }
}

#[cfg(not(feature = "browser"))]
pub use disabled::BrowserTool;

#[cfg(feature = "browser")]
mod enabled {
    use anyhow::{Context, Result};
    use async_trait::async_trait;
    use chromiumoxide::browser::{Browser, BrowserConfig};
    use chromiumoxide::page::ScreenshotParams;
    use chromiumoxide::Page;
    use futures::StreamExt;
    use serde::Deserialize;
    use serde_json::{json, Value};
    use std::time::Duration;
    use tokio::sync::Mutex;
    use tokio::task::JoinHandle;

    use crate::llm::{define_tool, ToolDefinition};
    use crate::tools::tool::{Tool, ToolContext, ToolInfo, ToolResult};
    use crate::tools::web_fetch::truncate;

    const DEFAULT_WAIT_SECS: u64 = 10;
    const POLL_INTERVAL: Duration = Duration::from_millis(250);

    struct Session {
        browser: Browser,
        page: Page,
        handler: JoinHandle<()>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(tag = "command", rename_all = "snake_case")]
    enum BrowserCommand {
        Navigate {
            url: String,
        },
        ClickText {
            text: String,
        },
        FillField {
            label: String,
            value: String,
        },
        GetContent,
        Screenshot {
            #[serde(default)]
            path: Option<String>,
        },
        WaitForText {
            text: String,
            #[serde(default)]
            timeout_secs: Option<u64>,
        },
        Close,
    }

    /// Headless browser the model can drive
    pub struct BrowserTool {
        session: Mutex<Option<Session>>,
    }

    impl BrowserTool {
        pub fn new() -> Result<Self> {
            Ok(Self {
                session: Mutex::new(None),
            })
        }

        async fn launch(&self) -> Result<Session> {
            tracing::info!("Launching headless browser");
            let config = BrowserConfig::builder()
                .build()
                .map_err(|e| anyhow::anyhow!("Invalid browser config: {}", e))?;

            let (browser, mut handler) = Browser::launch(config)
                .await
                .context("Failed to launch Chrome. Is it installed?")?;
            let handler = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if let Err(e) = event {
                        tracing::debug!("Browser handler stopped: {}", e);
                        break;
                    }
                }
            });
            let page = browser
                .new_page("about:blank")
                .await
                .context("Failed to open a browser tab")?;

            Ok(Session {
                browser,
                page,
                handler,
            })
        }

        /// The open page, launching the browser on first use
        async fn page(&self) -> Result<Page> {
            let mut session = self.session.lock().await;
            if session.is_none() {
                *session = Some(self.launch().await?);
            }
            match session.as_ref() {
                Some(s) => Ok(s.page.clone()),
                None => anyhow::bail!("Browser session is not available"),
            }
        }

        async fn navigate(&self, url: &str) -> Result<String> {
            let page = self.page().await?;
            page.goto(url).await.with_context(|| format!("Failed to open {}", url))?;
            page.wait_for_navigation().await?;
            let title = page.get_title().await?.unwrap_or_default();
            Ok(format!("Navigated to {} (title: {})", url, title))
        }

        async fn click_text(&self, text: &str) -> Result<String> {
            let page = self.page().await?;
            let script = format!(
                r#"(() => {{
                    const wanted = {text};
                    const els = Array.from(document.querySelectorAll(
                        'a, button, input[type=submit], input[type=button], [role=button], label, summary'));
                    const label = e => (e.innerText || e.value || '').trim();
                    const el = els.find(e => label(e) === wanted) || els.find(e => label(e).includes(wanted));
                    if (!el) return false;
                    el.click();
                    return true;
                }})()"#,
                text = serde_json::to_string(text)?
            );
            let clicked: bool = page.evaluate(script).await?.into_value()?;
            if !clicked {
                anyhow::bail!("No clickable element with text '{}'", text);
            }
            Ok(format!("Clicked '{}'", text))
        }

        async fn fill_field(&self, label: &str, value: &str) -> Result<String> {
            let page = self.page().await?;
            let script = format!(
                r#"(() => {{
                    const wanted = {label};
                    let field = null, how = 'label';
                    for (const l of document.querySelectorAll('label')) {{
                        if (l.innerText.trim().includes(wanted)) {{
                            field = l.control || (l.htmlFor && document.getElementById(l.htmlFor))
                                || l.querySelector('input, textarea, select');
                            if (field) break;
                        }}
                    }}
                    if (!field) {{
                        how = 'placeholder';
                        field = Array.from(document.querySelectorAll('input, textarea'))
                            .find(e => (e.placeholder || '').includes(wanted));
                    }}
                    if (!field) return '';
                    field.focus();
                    field.value = {value};
                    field.dispatchEvent(new Event('input', {{ bubbles: true }}));
                    field.dispatchEvent(new Event('change', {{ bubbles: true }}));
                    return how;
                }})()"#,
                label = serde_json::to_string(label)?,
                value = serde_json::to_string(value)?
            );
            let how: String = page.evaluate(script).await?.into_value()?;
            if how.is_empty() {
                anyhow::bail!("No field labelled '{}' (checked labels and placeholders)", label);
            }
            Ok(format!("Filled '{}' (matched by {})", label, how))
        }

        async fn get_content(&self) -> Result<String> {
            let page = self.page().await?;
            let title = page.get_title().await?.unwrap_or_default();
            let url = page.url().await?.unwrap_or_default();
            let text: String = page
                .evaluate("document.body ? document.body.innerText : ''")
                .await?
                .into_value()?;

            Ok(truncate(format!("Title: {}\nURL: {}\n\n{}", title, url, text)))
        }

        async fn screenshot(&self, path: Option<String>) -> Result<String> {
            let page = self.page().await?;
            let path = path.unwrap_or_else(|| "screenshot.png".to_string());
            page.save_screenshot(ScreenshotParams::builder().full_page(true).build(), &path)
                .await
                .with_context(|| format!("Failed to save screenshot to {}", path))?;
            Ok(format!("Saved screenshot to {}", path))
        }

        async fn wait_for_text(&self, text: &str, timeout_secs: u64) -> Result<String> {
            let page = self.page().await?;
            let script = format!(
                "document.body ? document.body.innerText.includes({}) : false",
                serde_json::to_string(text)?
            );
            let deadline = tokio::time::Instant::now() + Duration::from_secs(timeout_secs);
            loop {
                let found: bool = page.evaluate(script.as_str()).await?.into_value()?;
                if found {
                    return Ok(format!("Found text '{}'", text));
                }
                if tokio::time::Instant::now() >= deadline {
                    anyhow::bail!("Text '{}' did not appear within {}s", text, timeout_secs);
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        }

        async fn close(&self) -> Result<String> {
            let Some(mut session) = self.session.lock().await.take() else {
                return Ok("Browser was not open".to_string());
            };
            session.browser.close().await.context("Failed to close browser")?;
            if let Err(e) = session.browser.wait().await {
                tracing::warn!("Browser process did not exit cleanly: {}", e);
            }
            session.handler.abort();
            Ok("Browser closed".to_string())
        }

        async fn run(&self, command: BrowserCommand, ctx: &ToolContext<'_>) -> Result<String> {
            match command {
                BrowserCommand::Navigate { url } => {
                    ctx.console.tool_status(&format!("Opening {}", url));
                    self.navigate(&url).await
                }
                BrowserCommand::ClickText { text } => {
                    ctx.console.tool_status(&format!("Clicking '{}'", text));
                    self.click_text(&text).await
                }
                BrowserCommand::FillField { label, value } => {
                    ctx.console.tool_status(&format!("Filling '{}'", label));
                    self.fill_field(&label, &value).await
                }
                BrowserCommand::GetContent => {
                    ctx.console.tool_status("Reading page content");
                    self.get_content().await
                }
                BrowserCommand::Screenshot { path } => {
                    ctx.console.tool_status("Taking screenshot");
                    self.screenshot(path).await
                }
                BrowserCommand::WaitForText { text, timeout_secs } => {
                    ctx.console.tool_status(&format!("Waiting for '{}'", text));
                    self.wait_for_text(&text, timeout_secs.unwrap_or(DEFAULT_WAIT_SECS))
                        .await
                }
                BrowserCommand::Close => {
                    ctx.console.tool_status("Closing browser");
                    self.close().await
                }
            }
        }
    }

    #[async_trait]
    impl Tool for BrowserTool {
        fn name(&self) -> &str {
            "browser"
        }

        fn description(&self) -> &str {
            "Control a web browser: navigate, click by visible text, fill form fields, read page text, wait for text, take screenshots, close."
        }

        fn definition(&self) -> ToolDefinition {
            define_tool(
                self.name(),
                self.description(),
                json!({
                    "command": {
                        "type": "string",
                        "enum": ["navigate", "click_text", "fill_field", "get_content", "screenshot", "wait_for_text", "close"],
                        "description": "The browser action to perform"
                    },
                    "url": {"type": "string", "description": "URL for 'navigate'"},
                    "text": {"type": "string", "description": "Visible text for 'click_text' or 'wait_for_text'"},
                    "label": {"type": "string", "description": "Field label (or placeholder) for 'fill_field'"},
                    "value": {"type": "string", "description": "Value to type for 'fill_field'"},
                    "path": {"type": "string", "description": "Output file for 'screenshot' (default screenshot.png)"},
                    "timeout_secs": {"type": "integer", "description": "Seconds to wait for 'wait_for_text' (default 10)"}
                }),
                &["command"],
            )
        }

        fn get_info(&self, input: &Value) -> ToolInfo {
            let command = input.get("command").and_then(|v| v.as_str()).unwrap_or("unknown");
            let target = ["url", "text", "label", "path"]
                .iter()
                .find_map(|k| input.get(*k).and_then(|v| v.as_str()));
            ToolInfo {
                name: self.name().to_string(),
                action_description: format!("Browser: {}", command),
                details: target.map(String::from),
            }
        }

        async fn execute(&self, input: &Value, ctx: &ToolContext<'_>) -> Result<ToolResult> {
            let command: BrowserCommand = match serde_json::from_value(input.clone()) {
                Ok(command) => command,
                Err(e) => return Ok(ToolResult::error(format!("Invalid browser input: {}", e))),
            };
            match self.run(command, ctx).await {
                Ok(output) => Ok(ToolResult::success(output)),
                Err(e) => Ok(ToolResult::error(format!("Error: {:#}", e))),
            }
        }
    }
}

#[cfg(feature = "browser")]
pub use enabled::BrowserTool;
