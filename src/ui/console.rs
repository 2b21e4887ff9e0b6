use colored::*;
use std::io::{self, BufRead, IsTerminal, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use tokio::sync::mpsc;

use super::interrupt::{interrupted_error, Interrupt};
use super::stream::{Fragment, WordWrapper};
use crate::permissions::{PermissionDecision, PermissionRequest};
use crate::styles::{CustomBanner, Style};

/// Columns of padding on the left of every line
pub const LEFT_PADDING: usize = 2;
/// Columns kept free on the right when wrapping
pub const RIGHT_PADDING: usize = 2;

const DEFAULT_WIDTH: usize = 80;

/// Colour of a line of output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Plain,
    Dim,
    Bold,
    Cyan,
    BoldCyan,
    Red,
    Green,
    Yellow,
    Magenta,
    Blue,
}

/// In-memory writer that can be inspected after the console is done with it
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        let bytes = self.0.lock().unwrap_or_else(|e| e.into_inner());
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

type LineChannel = tokio::sync::Mutex<mpsc::UnboundedReceiver<String>>;

/// Where prompt answers come from
enum Source {
    /// Read in place; for scripted input that never blocks
    Reader(Mutex<Box<dyn BufRead + Send>>),
    /// Lines from a stdin thread started on the first prompt
    Stdin(OnceLock<LineChannel>),
    /// Lines pushed by the caller; closing the sender is end of input
    Lines(LineChannel),
}

/// Read stdin on a plain thread so a pending read never holds up the runtime
fn spawn_stdin_reader() -> LineChannel {
    let (tx, rx) = mpsc::unbounded_channel();
    let spawned = std::thread::Builder::new()
        .name("bespoken-stdin".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Failed to read stdin: {}", e);
                        break;
                    }
                }
            }
            tracing::debug!("Stdin reader finished");
        });
    if let Err(e) = spawned {
        tracing::error!("Failed to start stdin reader: {}", e);
    }
    tokio::sync::Mutex::new(rx)
}

/// Console handles all terminal I/O with padding and colored formatting
pub struct Console {
    source: Source,
    interrupt: Interrupt,
    output: Mutex<Box<dyn Write + Send>>,
    width: usize,
    color: bool,
    interactive: bool,
    debug: AtomicBool,
    wrapper: Mutex<Option<WordWrapper>>,
}

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl Console {
    /// Create a console on stdin/stdout sized to the terminal
    pub fn new() -> Self {
        let width = crossterm::terminal::size()
            .map(|(w, _)| w as usize)
            .unwrap_or(DEFAULT_WIDTH);
        let stdout_tty = io::stdout().is_terminal();
        Self {
            source: Source::Stdin(OnceLock::new()),
            interrupt: Interrupt::ctrl_c(),
            output: Mutex::new(Box::new(io::stdout())),
            width,
            color: stdout_tty,
            interactive: stdout_tty && io::stdin().is_terminal(),
            debug: AtomicBool::new(false),
            wrapper: Mutex::new(None),
        }
    }

    /// Create a console on arbitrary reader and writer, without colour
    pub fn with_io(
        input: impl BufRead + Send + 'static,
        output: impl Write + Send + 'static,
        width: usize,
    ) -> Self {
        Self::scripted(Source::Reader(Mutex::new(Box::new(input))), output, width)
    }

    /// Create a console whose input arrives on a channel
    ///
    /// Prompts wait for the next line and can be interrupted while they do.
    /// Dropping the sender ends the input.
    pub fn with_lines(
        lines: mpsc::UnboundedReceiver<String>,
        output: impl Write + Send + 'static,
        width: usize,
    ) -> Self {
        Self::scripted(Source::Lines(tokio::sync::Mutex::new(lines)), output, width)
    }

    fn scripted(source: Source, output: impl Write + Send + 'static, width: usize) -> Self {
        Self {
            source,
            interrupt: Interrupt::manual(),
            output: Mutex::new(Box::new(output)),
            width,
            color: false,
            interactive: false,
            debug: AtomicBool::new(false),
            wrapper: Mutex::new(None),
        }
    }

    /// Replace the interrupt prompts and turns race against
    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    pub fn interrupt(&self) -> &Interrupt {
        &self.interrupt
    }

    pub fn with_debug(self, debug: bool) -> Self {
        self.set_debug(debug);
        self
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Whether a human is at a terminal (spinners only draw then)
    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    pub fn is_debug(&self) -> bool {
        self.debug.load(Ordering::Relaxed)
    }

    pub fn set_debug(&self, debug: bool) {
        self.debug.store(debug, Ordering::Relaxed);
    }

    /// Flip debug mode and return the new value
    pub fn toggle_debug(&self) -> bool {
        !self.debug.fetch_xor(true, Ordering::Relaxed)
    }

    /// Colour text for this console (plain when colour is off)
    pub fn paint_text(&self, text: &str, tone: Tone) -> String {
        if !self.color || text.is_empty() {
            return text.to_string();
        }
        match tone {
            Tone::Plain => text.to_string(),
            Tone::Dim => text.dimmed().to_string(),
            Tone::Bold => text.bold().to_string(),
            Tone::Cyan => text.cyan().to_string(),
            Tone::BoldCyan => text.cyan().bold().to_string(),
            Tone::Red => text.red().to_string(),
            Tone::Green => text.green().to_string(),
            Tone::Yellow => text.yellow().to_string(),
            Tone::Magenta => text.magenta().to_string(),
            Tone::Blue => text.blue().to_string(),
        }
    }

    /// Write raw text and flush
    pub fn write_raw(&self, text: &str) {
        let mut out = lock(&self.output);
        if let Err(e) = out.write_all(text.as_bytes()).and_then(|_| out.flush()) {
            tracing::warn!("Failed to write to console: {}", e);
        }
    }

    /// Erase the current terminal line (used by the spinner)
    pub fn clear_line(&self) {
        let mut out = lock(&self.output);
        let result = crossterm::queue!(
            out,
            crossterm::cursor::MoveToColumn(0),
            crossterm::terminal::Clear(crossterm::terminal::ClearType::CurrentLine)
        )
        .and_then(|_| out.flush());
        if let Err(e) = result {
            tracing::warn!("Failed to clear console line: {}", e);
        }
    }

    // ------------------------------------------------------------------
    // Padded output
    // ------------------------------------------------------------------

    /// Print text with left padding on every line
    pub fn print(&self, text: &str) {
        self.print_indented(text, LEFT_PADDING);
    }

    pub fn print_indented(&self, text: &str, indent: usize) {
        self.print_lines(text, indent, Tone::Plain);
    }

    /// Print padded text in a colour
    pub fn print_colored(&self, text: &str, tone: Tone) {
        self.print_lines(text, LEFT_PADDING, tone);
    }

    fn print_lines(&self, text: &str, indent: usize, tone: Tone) {
        let pad = " ".repeat(indent);
        let mut buf = String::new();
        for line in text.split('\n') {
            buf.push_str(&pad);
            buf.push_str(&self.paint_text(line, tone));
            buf.push('\n');
        }
        self.write_raw(&buf);
    }

    pub fn blank_line(&self) {
        self.write_raw("\n");
    }

    // ------------------------------------------------------------------
    // Streaming
    // ------------------------------------------------------------------

    /// Begin a wrapped stream at the given indent
    pub fn start_stream(&self, indent: usize) {
        *lock(&self.wrapper) = Some(WordWrapper::new(self.width, indent, true));
    }

    /// Write one chunk of a stream started with [`Console::start_stream`]
    pub fn stream_chunk(&self, chunk: &str) {
        let fragments = {
            let mut wrapper = lock(&self.wrapper);
            let wrapper = wrapper.get_or_insert_with(|| WordWrapper::new(self.width, LEFT_PADDING, true));
            wrapper.push(chunk)
        };
        self.render(&fragments);
    }

    /// Flush the last word and end the line if it is still open
    pub fn end_stream(&self) {
        let Some(mut wrapper) = lock(&self.wrapper).take() else {
            return;
        };
        let fragments = wrapper.finish();
        self.render(&fragments);
        if !wrapper.at_line_start() {
            self.write_raw("\n");
        }
    }

    /// Stream a sequence of chunks with word-aware wrapping
    pub fn stream<I, S>(&self, chunks: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.start_stream(LEFT_PADDING);
        for chunk in chunks {
            self.stream_chunk(chunk.as_ref());
        }
        self.end_stream();
    }

    /// Print assistant-style text that did not come from the model
    pub fn print_neutral(&self, text: &str) {
        self.stream([text]);
    }

    fn render(&self, fragments: &[Fragment]) {
        if fragments.is_empty() {
            return;
        }
        let mut buf = String::new();
        for fragment in fragments {
            match fragment {
                Fragment::Indent(n) => buf.push_str(&" ".repeat(*n)),
                Fragment::Text(text) => buf.push_str(&self.paint_text(text, Tone::Dim)),
                Fragment::Newline => buf.push('\n'),
            }
        }
        self.write_raw(&buf);
    }

    // ------------------------------------------------------------------
    // Tool messages
    // ------------------------------------------------------------------

    /// Status line for a running tool, set off by blank lines
    pub fn tool_status(&self, message: &str) {
        self.blank_line();
        self.print_colored(message, Tone::Cyan);
        self.blank_line();
    }

    pub fn tool_error(&self, message: &str) {
        self.print_colored(message, Tone::Red);
    }

    pub fn tool_success(&self, message: &str) {
        self.print_colored(message, Tone::Green);
    }

    pub fn tool_warning(&self, message: &str) {
        self.print_colored(message, Tone::Yellow);
    }

    /// Debug output, only shown in debug mode
    pub fn tool_debug(&self, message: &str) {
        if self.is_debug() {
            self.print_colored(message, Tone::Magenta);
        }
    }

    // ------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------

    /// Read a line of input. Returns `None` at end of input.
    ///
    /// Blocks the calling thread. An interrupt fails the read with
    /// [`io::ErrorKind::Interrupted`].
    pub fn input(&self, prompt: &str) -> io::Result<Option<String>> {
        self.input_indented(prompt, LEFT_PADDING)
    }

    pub fn input_indented(&self, prompt: &str, indent: usize) -> io::Result<Option<String>> {
        self.write_prompt(prompt, indent);
        futures::executor::block_on(self.next_line())
    }

    /// Async form of [`Console::input`]
    pub async fn read_line(&self, prompt: &str) -> io::Result<Option<String>> {
        self.write_prompt(prompt, LEFT_PADDING);
        self.next_line().await
    }

    fn write_prompt(&self, prompt: &str, indent: usize) {
        self.write_raw(&format!("{}{}", " ".repeat(indent), self.paint_text(prompt, Tone::Bold)));
    }

    async fn next_line(&self) -> io::Result<Option<String>> {
        let channel = match &self.source {
            Source::Reader(reader) => {
                let mut line = String::new();
                let read = lock(reader).read_line(&mut line)?;
                return Ok((read > 0).then(|| line.trim().to_string()));
            }
            Source::Stdin(cell) => cell.get_or_init(spawn_stdin_reader),
            Source::Lines(channel) => channel,
        };

        let interrupted = self.interrupt.wait();
        let mut lines = channel.lock().await;
        tokio::select! {
            line = lines.recv() => Ok(line.map(|line| line.trim().to_string())),
            _ = interrupted => Err(interrupted_error()),
        }
    }

    /// Ask a yes/no question. Empty input picks the default; end of input too.
    pub fn confirm(&self, prompt: &str, default: bool) -> io::Result<bool> {
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        loop {
            let Some(answer) = self.input(&format!("{} {}: ", prompt, hint))? else {
                return Ok(default);
            };
            match answer.to_lowercase().as_str() {
                "" => return Ok(default),
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => self.tool_warning("Please enter y or n"),
            }
        }
    }

    /// Present a numbered menu and return the chosen entry
    pub fn choice(&self, prompt: &str, choices: &[&str]) -> anyhow::Result<String> {
        if choices.is_empty() {
            anyhow::bail!("No choices to pick from");
        }

        self.print(prompt);
        for (i, choice) in choices.iter().enumerate() {
            self.print_indented(&format!("{}. {}", i + 1, choice), LEFT_PADDING + 2);
        }

        loop {
            let Some(answer) = self.input(&format!("Enter choice [1-{}]: ", choices.len()))? else {
                anyhow::bail!("Input closed before a choice was made");
            };

            if let Ok(n) = answer.parse::<usize>() {
                if (1..=choices.len()).contains(&n) {
                    return Ok(choices[n - 1].to_string());
                }
            }
            if let Some(choice) = choices.iter().find(|c| **c == answer) {
                return Ok(choice.to_string());
            }
            self.tool_warning("Please select one of the listed options");
        }
    }

    /// Ask the user whether a tool may run
    ///
    /// Fails with [`io::ErrorKind::Interrupted`] if the user interrupts the
    /// question; nothing has been decided then.
    pub async fn ask_permission(&self, request: &PermissionRequest) -> io::Result<PermissionDecision> {
        self.blank_line();
        self.print_colored(
            &format!("Permission required: {}", request.tool_name),
            Tone::Yellow,
        );
        self.print(&request.action_description);
        if let Some(details) = &request.details {
            self.print_indented(details, LEFT_PADDING + 2);
        }

        loop {
            let Some(answer) = self.read_line("Allow? [Y/n/always/never]: ").await? else {
                return Ok(PermissionDecision::Deny);
            };
            let decision = match answer.to_lowercase().as_str() {
                "" | "y" | "yes" => PermissionDecision::Allow,
                "n" | "no" => PermissionDecision::Deny,
                "a" | "always" => PermissionDecision::AlwaysAllow,
                "never" => PermissionDecision::AlwaysDeny,
                _ => {
                    self.tool_warning("Please answer y, n, always or never");
                    continue;
                }
            };
            return Ok(decision);
        }
    }

    /// Print the ASCII-art banner of a style
    pub fn show_banner(&self, style: &Style) {
        self.banner(style.ascii_art, style.subtitle);
    }

    /// Print caller-supplied art, under the default subtitle unless one is given
    pub fn show_custom_banner(&self, banner: &CustomBanner) {
        match &banner.subtitle {
            Some(subtitle) => self.banner(&banner.ascii_art, &[(subtitle.as_str(), Tone::Plain)]),
            None => self.banner(&banner.ascii_art, Style::default_style().subtitle),
        }
    }

    fn banner(&self, ascii_art: &str, subtitle: &[(&str, Tone)]) {
        self.blank_line();
        self.print_colored(ascii_art, Tone::BoldCyan);
        self.blank_line();
        for (line, tone) in subtitle {
            self.print_colored(line, *tone);
        }
        self.blank_line();
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::styles;
    use std::io::Cursor;

    fn console_with(input: &str) -> (Console, SharedBuffer) {
        let out = SharedBuffer::new();
        let console = Console::with_io(Cursor::new(input.to_string()), out.clone(), 80);
        (console, out)
    }

    #[test]
    fn test_padding_constants() {
        assert_eq!(LEFT_PADDING, 2);
        assert_eq!(RIGHT_PADDING, 2);
    }

    #[test]
    fn test_print_pads_every_line() {
        let (console, out) = console_with("");
        console.print("Hello, World!");
        console.print("Line 1\nLine 2");
        console.print_indented("Custom indent", 4);
        assert_eq!(
            out.contents(),
            "  Hello, World!\n  Line 1\n  Line 2\n    Custom indent\n"
        );
    }

    #[test]
    fn test_tool_messages() {
        let (console, out) = console_with("");
        console.tool_status("Running test command");
        console.tool_error("Something went wrong");
        console.tool_success("Operation completed");
        console.tool_warning("This might be a problem");
        assert_eq!(
            out.contents(),
            "\n  Running test command\n\n  Something went wrong\n  Operation completed\n  This might be a problem\n"
        );
    }

    #[test]
    fn test_tool_debug_only_in_debug_mode() {
        let (console, out) = console_with("");
        console.tool_debug("hidden");
        assert_eq!(out.contents(), "");

        assert!(console.toggle_debug());
        console.tool_debug("Line 1\nLine 2");
        assert_eq!(out.contents(), "  Line 1\n  Line 2\n");

        assert!(!console.toggle_debug());
        assert!(!console.is_debug());
    }

    #[test]
    fn test_stream_wraps_and_pads() {
        let out = SharedBuffer::new();
        let console = Console::with_io(Cursor::new(String::new()), out.clone(), 20);
        console.stream(["This is a very long ", "line that should wrap"]);
        let text = out.contents();
        assert!(text.ends_with('\n'));
        for line in text.lines() {
            assert!(line.starts_with("  "), "unpadded line: {:?}", line);
            assert!(line.trim_end().chars().count() <= 18, "line too long: {:?}", line);
        }
        assert!(text.lines().count() > 1);
    }

    #[test]
    fn test_print_neutral_ends_line() {
        let (console, out) = console_with("");
        console.print_neutral("Neutral text message");
        assert_eq!(out.contents(), "  Neutral text message\n");
    }

    #[test]
    fn test_stream_keeps_newlines() {
        let (console, out) = console_with("");
        console.stream(["Line 1\nLine 2\n"]);
        assert_eq!(out.contents(), "  Line 1\n  Line 2\n");
    }

    #[test]
    fn test_input_and_eof() {
        let (console, out) = console_with("  hello  \n");
        assert_eq!(console.input("> ").unwrap(), Some("hello".to_string()));
        assert_eq!(console.input("> ").unwrap(), None);
        assert_eq!(out.contents(), "  >   > ");
    }

    #[test]
    fn test_confirm() {
        let (console, out) = console_with("maybe\nYES\n\n");
        assert!(console.confirm("Continue with operation?", false).unwrap());
        assert!(out.contents().starts_with("  Continue with operation? [y/N]: "));
        assert!(out.contents().contains("Please enter y or n"));
        assert!(!console.confirm("Again?", false).unwrap());
        // end of input falls back to the default
        assert!(console.confirm("Once more?", true).unwrap());
    }

    #[test]
    fn test_choice_by_number_and_name() {
        let (console, out) = console_with("7\n2\npirate\n");
        let roles = ["technical teacher", "pirate"];
        assert_eq!(console.choice("Select an option:", &roles).unwrap(), "pirate");
        assert_eq!(console.choice("Select an option:", &roles).unwrap(), "pirate");
        let text = out.contents();
        assert!(text.contains("  Select an option:\n    1. technical teacher\n    2. pirate\n"));
        assert!(text.contains("Please select one of the listed options"));
        assert!(console.choice("Select an option:", &roles).is_err());
    }

    #[tokio::test]
    async fn test_ask_permission_answers() {
        let (console, _out) = console_with("\nn\nalways\nnever\nwhat\ny\n");
        let request = PermissionRequest::new("file_edit", "Create file").with_details("Path: a.txt");
        assert_eq!(console.ask_permission(&request).await.unwrap(), PermissionDecision::Allow);
        assert_eq!(console.ask_permission(&request).await.unwrap(), PermissionDecision::Deny);
        assert_eq!(
            console.ask_permission(&request).await.unwrap(),
            PermissionDecision::AlwaysAllow
        );
        assert_eq!(
            console.ask_permission(&request).await.unwrap(),
            PermissionDecision::AlwaysDeny
        );
        assert_eq!(console.ask_permission(&request).await.unwrap(), PermissionDecision::Allow);
        assert_eq!(console.ask_permission(&request).await.unwrap(), PermissionDecision::Deny);
    }

    #[test]
    fn test_banner_lines_are_padded() {
        let (console, out) = console_with("");
        console.show_banner(styles::Style::default_style());
        for line in out.contents().lines().filter(|l| !l.is_empty()) {
            assert!(line.starts_with("  "), "unpadded banner line: {:?}", line);
        }
        assert!(out.contents().contains("Type 'quit' to exit."));
    }

    #[test]
    fn test_custom_banner() {
        let (console, out) = console_with("");
        console.show_custom_banner(&CustomBanner::new("MY BOT").with_subtitle("line one\nline two"));
        assert_eq!(out.contents(), "\n  MY BOT\n\n  line one\n  line two\n\n");

        let (console, out) = console_with("");
        console.show_custom_banner(&CustomBanner::new("MY BOT"));
        assert!(out.contents().contains("  MY BOT\n"));
        assert!(out.contents().contains("Type 'quit' to exit."));
    }

    #[tokio::test]
    async fn test_line_channel_input() {
        let (tx, rx) = mpsc::unbounded_channel();
        let out = SharedBuffer::new();
        let console = Console::with_lines(rx, out.clone(), 80);

        tx.send(" first ".to_string()).unwrap();
        assert_eq!(console.read_line("> ").await.unwrap(), Some("first".to_string()));
        drop(tx);
        assert_eq!(console.read_line("> ").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_interrupt_ends_a_waiting_prompt() {
        let (_tx, rx) = mpsc::unbounded_channel();
        let console = Arc::new(Console::with_lines(rx, SharedBuffer::new(), 80));
        let interrupt = console.interrupt().clone();

        let waiting = tokio::spawn({
            let console = console.clone();
            async move { console.read_line("> ").await }
        });
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        interrupt.trigger();

        let err = waiting.await.unwrap().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Interrupted);
    }

    #[tokio::test]
    async fn test_interrupted_permission_question_decides_nothing() {
        let (tx, rx) = mpsc::unbounded_channel::<String>();
        let console = Arc::new(Console::with_lines(rx, SharedBuffer::new(), 80));
        let interrupt = console.interrupt().clone();

        let asking = tokio::spawn({
            let console = console.clone();
            async move {
                let request = PermissionRequest::new("file_edit", "Create file");
                console.ask_permission(&request).await
            }
        });
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        interrupt.trigger();
        assert!(asking.await.unwrap().is_err());

        // the answer typed afterwards goes to the next prompt
        tx.send("y".to_string()).unwrap();
        assert_eq!(console.read_line("> ").await.unwrap(), Some("y".to_string()));
    }

    #[test]
    fn test_runtime_shuts_down_with_a_stdin_read_pending() {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .unwrap();
        let console = Console::new().with_interrupt(Interrupt::manual());

        runtime.block_on(async {
            tokio::select! {
                _ = console.read_line("") => {}
                _ = tokio::time::sleep(std::time::Duration::from_millis(50)) => {}
            }
        });

        let (done_tx, done_rx) = std::sync::mpsc::channel();
        std::thread::spawn(move || {
            drop(runtime);
            done_tx.send(()).ok();
        });
        assert!(
            done_rx.recv_timeout(std::time::Duration::from_secs(5)).is_ok(),
            "dropping the runtime waited on the stdin read"
        );
    }
}
