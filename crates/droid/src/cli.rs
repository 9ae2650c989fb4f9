//! CLI (Command Line Interface) mode
//!
//! Output helpers for the one-shot commands and an interactive REPL for
//! running crews and inspecting definitions and memory.

use std::borrow::Cow;

use anyhow::Context;
use droid_core::{CrewInputs, CrewRunResult, MemoryFilter, Orchestrator, Tool};
use nu_ansi_term::{Color, Style};
use reedline::{
    ColumnarMenu, Completer, DefaultHinter, Emacs, KeyCode, KeyModifiers, Keybindings,
    MenuBuilder, Prompt, PromptEditMode, PromptHistorySearch, Reedline, ReedlineEvent,
    ReedlineMenu, Signal, Suggestion,
};
use tracing::info;

use crate::ListKind;

/// Available commands for autocomplete display
const COMMANDS: &[(&str, &str)] = &[
    ("/run", "Run a crew: /run <crew> [inputs JSON]"),
    ("/list", "List agents, tasks, crews or tools"),
    ("/memory", "Show recent memory records: /memory [limit]"),
    ("/help", "Show this help"),
    ("/exit", "Exit the program"),
];

/// Command completer for reedline
#[derive(Clone)]
pub struct CommandCompleter {
    commands: Vec<(&'static str, &'static str)>,
}

impl CommandCompleter {
    pub fn new() -> Self {
        Self {
            commands: COMMANDS.to_vec(),
        }
    }
}

impl Default for CommandCompleter {
    fn default() -> Self {
        Self::new()
    }
}

impl Completer for CommandCompleter {
    fn complete(&mut self, line: &str, pos: usize) -> Vec<Suggestion> {
        if !line.starts_with('/') {
            return Vec::new();
        }

        self.commands
            .iter()
            .filter(|(cmd, _)| cmd.starts_with(line))
            .map(|(cmd, desc)| Suggestion {
                value: cmd.to_string(),
                description: Some(desc.to_string()),
                extra: None,
                span: reedline::Span::new(0, pos),
                append_whitespace: true,
                style: None,
            })
            .collect()
    }
}

struct ColoredPrompt {
    style: Style,
}

impl ColoredPrompt {
    fn new() -> Self {
        Self {
            style: Color::Cyan.bold(),
        }
    }
}

impl Prompt for ColoredPrompt {
    fn render_prompt_left(&self) -> Cow<'_, str> {
        Cow::Owned(self.style.paint("droid> ").to_string())
    }

    fn render_prompt_right(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, _prompt_mode: PromptEditMode) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_history_search_indicator(
        &self,
        _history_search: PromptHistorySearch,
    ) -> Cow<'_, str> {
        Cow::Borrowed("")
    }
}

/// A parsed REPL line
#[derive(Debug, PartialEq)]
pub enum ReplCommand {
    Run { crew: String, inputs: Option<String> },
    List(ListKind),
    Memory(usize),
    Help,
    Exit,
    Unknown(String),
    Empty,
}

pub fn parse_repl_command(line: &str) -> ReplCommand {
    let line = line.trim();
    if line.is_empty() {
        return ReplCommand::Empty;
    }

    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };

    match command.to_lowercase().as_str() {
        "/run" if !rest.is_empty() => {
            let (crew, inputs) = match rest.split_once(char::is_whitespace) {
                Some((crew, inputs)) => (crew, Some(inputs.trim().to_string())),
                None => (rest, None),
            };
            ReplCommand::Run {
                crew: crew.to_string(),
                inputs,
            }
        }
        "/list" => match rest {
            "agents" => ReplCommand::List(ListKind::Agents),
            "tasks" => ReplCommand::List(ListKind::Tasks),
            "crews" | "" => ReplCommand::List(ListKind::Crews),
            "tools" => ReplCommand::List(ListKind::Tools),
            _ => ReplCommand::Unknown(line.to_string()),
        },
        "/memory" => match rest {
            "" => ReplCommand::Memory(10),
            n => n
                .parse()
                .map(ReplCommand::Memory)
                .unwrap_or_else(|_| ReplCommand::Unknown(line.to_string())),
        },
        "/help" | "/?" => ReplCommand::Help,
        "/exit" | "/quit" | "/q" => ReplCommand::Exit,
        _ => ReplCommand::Unknown(line.to_string()),
    }
}

/// Parse `--inputs` JSON into crew inputs; non-string values are stringified
pub fn parse_inputs(raw: Option<&str>) -> anyhow::Result<CrewInputs> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(CrewInputs::new());
    };

    let value: serde_json::Value = serde_json::from_str(raw).context("Inputs must be valid JSON")?;
    let object = value
        .as_object()
        .context("Inputs must be a JSON object")?;

    Ok(object
        .iter()
        .map(|(k, v)| {
            let text = match v {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (k.clone(), text)
        })
        .collect())
}

pub fn print_list(orchestrator: &Orchestrator, kind: ListKind) {
    let names = match kind {
        ListKind::Agents => orchestrator.list_agents(),
        ListKind::Tasks => orchestrator.list_tasks(),
        ListKind::Crews => orchestrator.list_crews(),
        ListKind::Tools => orchestrator.list_tools(),
    };

    for name in names {
        let detail = match kind {
            ListKind::Agents => orchestrator.get_agent(&name).map(|a| a.role.clone()),
            ListKind::Tasks => orchestrator.get_task(&name).map(|t| format!("agent: {}", t.agent)),
            ListKind::Crews => orchestrator
                .get_crew(&name)
                .map(|c| format!("tasks: {}", c.tasks.join(" -> "))),
            ListKind::Tools => orchestrator
                .tools()
                .get(&name)
                .map(|t| t.description().to_string()),
        };
        match detail {
            Some(detail) => println!("{}  {}", Color::Green.paint(&name), detail),
            None => println!("{}", Color::Green.paint(&name)),
        }
    }
}

pub fn print_memory(orchestrator: &Orchestrator, filter: &MemoryFilter) -> anyhow::Result<()> {
    let Some(store) = orchestrator.memory() else {
        println!("No memory store configured");
        return Ok(());
    };

    let records = store.query(filter)?;
    if records.is_empty() {
        println!("No memory records");
    }
    for record in records {
        println!(
            "{} [{}] {}: {}",
            Style::new().dimmed().paint(record.created_at.format("%Y-%m-%d %H:%M:%S").to_string()),
            record.category,
            Color::Green.paint(&record.key),
            truncate(&record.content, 200).replace('\n', " ")
        );
    }
    Ok(())
}

fn print_result(result: &CrewRunResult) {
    println!();
    for task in &result.execution_order {
        println!("{} {}", Color::Cyan.bold().paint(format!("[{}]", task)), result.task_outputs[task]);
    }
    println!();
    if result.success {
        println!("{} {}", Color::Green.bold().paint("Crew completed:"), result.crew);
        println!("{}", result.output);
    } else {
        println!(
            "{} {}",
            Color::Red.bold().paint("Crew failed:"),
            result.error.as_deref().unwrap_or("unknown error")
        );
    }
    println!();
}

/// Run CLI interactive mode
pub async fn run_repl(orchestrator: Orchestrator) -> anyhow::Result<()> {
    info!(
        crews = orchestrator.list_crews().len(),
        tools = orchestrator.list_tools().len(),
        "Starting REPL"
    );

    print_welcome();

    let mut keybindings = default_keybindings();
    keybindings.add_binding(
        KeyModifiers::NONE,
        KeyCode::Char('/'),
        ReedlineEvent::Edit(vec![reedline::EditCommand::InsertChar('/'), reedline::EditCommand::Complete]),
    );

    let menu = Box::new(
        ColumnarMenu::default()
            .with_name("command_menu")
            .with_columns(1)
            .with_column_width(Some(50))
            .with_only_buffer_difference(false),
    );
    let hinter = DefaultHinter::default().with_style(Style::new().dimmed());

    let mut line_editor = Reedline::create()
        .with_completer(Box::new(CommandCompleter::new()))
        .with_menu(ReedlineMenu::EngineCompleter(menu))
        .with_hinter(Box::new(hinter))
        .with_edit_mode(Box::new(Emacs::new(keybindings)));

    let prompt = ColoredPrompt::new();

    loop {
        let line = match line_editor.read_line(&prompt) {
            Ok(Signal::Success(line)) => line,
            Ok(Signal::CtrlC) => {
                println!("^C");
                continue;
            }
            Ok(Signal::CtrlD) => break,
            Err(err) => {
                eprintln!("\nError: {}\n", err);
                break;
            }
        };

        match parse_repl_command(&line) {
            ReplCommand::Empty => continue,
            ReplCommand::Exit => break,
            ReplCommand::Help => print_help(),
            ReplCommand::List(kind) => print_list(&orchestrator, kind),
            ReplCommand::Memory(limit) => {
                if let Err(e) = print_memory(&orchestrator, &MemoryFilter::default().limit(limit)) {
                    eprintln!("\nError: {}\n", e);
                }
            }
            ReplCommand::Run { crew, inputs } => {
                let inputs = match parse_inputs(inputs.as_deref()) {
                    Ok(inputs) => inputs,
                    Err(e) => {
                        eprintln!("\nError: {:#}\n", e);
                        continue;
                    }
                };
                println!("Running crew {}...", crew);
                match orchestrator.run_crew(&crew, &inputs).await {
                    Ok(result) => print_result(&result),
                    Err(e) => eprintln!("\nError: {}\n", e),
                }
            }
            ReplCommand::Unknown(input) => {
                eprintln!("\nUnknown command: {}. Type /help for the command list.\n", input);
            }
        }
    }

    println!("\nGoodbye!\n");
    Ok(())
}

fn default_keybindings() -> Keybindings {
    let mut keybindings = Keybindings::new();
    keybindings.add_binding(
        KeyModifiers::NONE,
        KeyCode::Tab,
        ReedlineEvent::Edit(vec![reedline::EditCommand::Complete]),
    );
    keybindings.add_binding(KeyModifiers::NONE, KeyCode::Enter, ReedlineEvent::Submit);
    keybindings.add_binding(KeyModifiers::NONE, KeyCode::Esc, ReedlineEvent::Esc);
    keybindings.add_binding(KeyModifiers::CONTROL, KeyCode::Char('c'), ReedlineEvent::CtrlC);
    keybindings.add_binding(KeyModifiers::CONTROL, KeyCode::Char('d'), ReedlineEvent::CtrlD);
    keybindings.add_binding(KeyModifiers::NONE, KeyCode::Up, ReedlineEvent::Up);
    keybindings.add_binding(KeyModifiers::NONE, KeyCode::Down, ReedlineEvent::Down);
    keybindings
}

fn print_welcome() {
    println!();
    println!("{}", Color::Cyan.bold().paint("droid interactive mode"));
    println!("Commands: /run, /list, /memory, /help, /exit");
    println!();
}

fn print_help() {
    println!();
    println!("Available commands:");
    for (cmd, desc) in COMMANDS {
        println!("  {:<8} {}", cmd, desc);
    }
    println!();
}

fn truncate(s: &str, max_chars: usize) -> Cow<'_, str> {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => Cow::Owned(format!("{}...", &s[..idx])),
        None => Cow::Borrowed(s),
    }
}
