//! Scene definition and per-scene routing
//!
//! A [`Scene`] is configured with chained builder calls and is immutable once
//! registered with a stage. [`Scene::handle_update`] routes one update with a
//! fixed precedence: callback actions, `/start`, other commands, text
//! triggers, predicate filters, the generic message handler, then the
//! remaining filters.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use futures::future::BoxFuture;
use regex::Regex;
use tracing::debug;

use crate::middleware::pipeline::Handler;
use crate::state::UpdateContext;
use crate::utils::errors::Result;

static COMMAND_RE: OnceLock<Regex> = OnceLock::new();

/// Command name of a `/name ...` message, without the slash
pub fn parse_command(text: &str) -> Option<&str> {
    let re = COMMAND_RE.get_or_init(|| Regex::new(r"^/([A-Za-z0-9_]+)").unwrap());
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// What a callback action matched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackMatch {
    /// Full callback payload
    pub data: String,
    /// Group 0 is the matched text, followed by the pattern's capture groups
    pub groups: Vec<Option<String>>,
}

impl CallbackMatch {
    pub fn group(&self, index: usize) -> Option<&str> {
        self.groups.get(index).and_then(|g| g.as_deref())
    }
}

/// Callback action handler; receives the match explicitly
pub type ActionHandler =
    Arc<dyn for<'a> Fn(&'a mut UpdateContext, CallbackMatch) -> BoxFuture<'a, Result<()>> + Send + Sync>;

/// Payload or text trigger
#[derive(Debug, Clone)]
pub enum Trigger {
    /// Whole-string equality
    Exact(String),
    /// Regex search anywhere in the input
    Pattern(Regex),
}

impl Trigger {
    /// Match groups when `input` triggers, group 0 being the matched text
    pub fn captures(&self, input: &str) -> Option<Vec<Option<String>>> {
        match self {
            Trigger::Exact(expected) => (expected == input).then(|| vec![Some(input.to_string())]),
            Trigger::Pattern(re) => re.captures(input).map(|caps| {
                caps.iter()
                    .map(|m| m.map(|m| m.as_str().to_string()))
                    .collect()
            }),
        }
    }

    pub fn is_match(&self, input: &str) -> bool {
        match self {
            Trigger::Exact(expected) => expected == input,
            Trigger::Pattern(re) => re.is_match(input),
        }
    }

    fn same_exact(&self, other: &Trigger) -> bool {
        matches!((self, other), (Trigger::Exact(a), Trigger::Exact(b)) if a == b)
    }
}

impl From<&str> for Trigger {
    fn from(value: &str) -> Self {
        Trigger::Exact(value.to_string())
    }
}

impl From<String> for Trigger {
    fn from(value: String) -> Self {
        Trigger::Exact(value)
    }
}

impl From<Regex> for Trigger {
    fn from(value: Regex) -> Self {
        Trigger::Pattern(value)
    }
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trigger::Exact(s) => write!(f, "{:?}", s),
            Trigger::Pattern(re) => write!(f, "/{}/", re.as_str()),
        }
    }
}

/// Predicate over the update context
pub type Predicate = Arc<dyn Fn(&UpdateContext) -> bool + Send + Sync>;

/// Filter for `on(...)` handlers
#[derive(Clone)]
pub enum EventFilter {
    Predicate(Predicate),
    /// Update type tag, also matching `message_<tag>`
    UpdateType(String),
    /// Regex tested against the message text (empty when absent)
    TextPattern(Regex),
}

impl EventFilter {
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&UpdateContext) -> bool + Send + Sync + 'static,
    {
        EventFilter::Predicate(Arc::new(f))
    }

    fn is_generic_message(&self) -> bool {
        matches!(self, EventFilter::UpdateType(tag) if tag == "message" || tag == "message_created")
    }
}

impl From<&str> for EventFilter {
    fn from(value: &str) -> Self {
        EventFilter::UpdateType(value.to_string())
    }
}

impl From<String> for EventFilter {
    fn from(value: String) -> Self {
        EventFilter::UpdateType(value)
    }
}

impl From<Regex> for EventFilter {
    fn from(value: Regex) -> Self {
        EventFilter::TextPattern(value)
    }
}

impl std::fmt::Debug for EventFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventFilter::Predicate(_) => f.write_str("Predicate(..)"),
            EventFilter::UpdateType(tag) => f.debug_tuple("UpdateType").field(tag).finish(),
            EventFilter::TextPattern(re) => f.debug_tuple("TextPattern").field(&re.as_str()).finish(),
        }
    }
}

/// Named conversation handler
#[derive(Clone)]
pub struct Scene {
    id: String,
    ttl: Option<u64>,
    enter_handler: Option<Handler>,
    leave_handler: Option<Handler>,
    commands: HashMap<String, Handler>,
    actions: Vec<(Trigger, ActionHandler)>,
    hears: Vec<(Trigger, Handler)>,
    text_handler: Option<Handler>,
    message_handler: Option<Handler>,
    events: Vec<(EventFilter, Handler)>,
}

impl Scene {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ttl: None,
            enter_handler: None,
            leave_handler: None,
            commands: HashMap::new(),
            actions: Vec::new(),
            hears: Vec::new(),
            text_handler: None,
            message_handler: None,
            events: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Scene lifetime in seconds, overriding the stage default
    pub fn ttl_seconds(&self) -> Option<u64> {
        self.ttl
    }

    pub fn ttl(mut self, seconds: u64) -> Self {
        self.ttl = Some(seconds);
        self
    }

    /// Hook run when the scene is entered
    pub fn enter<F>(mut self, f: F) -> Self
    where
        F: for<'a> Fn(&'a mut UpdateContext) -> BoxFuture<'a, Result<()>> + Send + Sync + 'static,
    {
        self.enter_handler = Some(Arc::new(f));
        self
    }

    /// Hook run when the scene is left
    pub fn leave<F>(mut self, f: F) -> Self
    where
        F: for<'a> Fn(&'a mut UpdateContext) -> BoxFuture<'a, Result<()>> + Send + Sync + 'static,
    {
        self.leave_handler = Some(Arc::new(f));
        self
    }

    /// `/start` handler, matched as a text prefix ahead of other commands
    pub fn start<F>(self, f: F) -> Self
    where
        F: for<'a> Fn(&'a mut UpdateContext) -> BoxFuture<'a, Result<()>> + Send + Sync + 'static,
    {
        self.command("start", f)
    }

    /// Command handler; `name` is given without the slash
    pub fn command<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: for<'a> Fn(&'a mut UpdateContext) -> BoxFuture<'a, Result<()>> + Send + Sync + 'static,
    {
        self.commands.insert(name.into(), Arc::new(f));
        self
    }

    /// Callback action handler; an existing exact trigger keeps its position
    pub fn action<F>(mut self, trigger: impl Into<Trigger>, f: F) -> Self
    where
        F: for<'a> Fn(&'a mut UpdateContext, CallbackMatch) -> BoxFuture<'a, Result<()>> + Send + Sync + 'static,
    {
        let trigger = trigger.into();
        let handler: ActionHandler = Arc::new(f);
        match self.actions.iter_mut().find(|(t, _)| t.same_exact(&trigger)) {
            Some(entry) => entry.1 = handler,
            None => self.actions.push((trigger, handler)),
        }
        self
    }

    /// Text trigger handler
    pub fn hears<F>(mut self, trigger: impl Into<Trigger>, f: F) -> Self
    where
        F: for<'a> Fn(&'a mut UpdateContext) -> BoxFuture<'a, Result<()>> + Send + Sync + 'static,
    {
        let trigger = trigger.into();
        let handler: Handler = Arc::new(f);
        match self.hears.iter_mut().find(|(t, _)| t.same_exact(&trigger)) {
            Some(entry) => entry.1 = handler,
            None => self.hears.push((trigger, handler)),
        }
        self
    }

    /// Handler for any text that no command or trigger took
    pub fn text<F>(mut self, f: F) -> Self
    where
        F: for<'a> Fn(&'a mut UpdateContext) -> BoxFuture<'a, Result<()>> + Send + Sync + 'static,
    {
        self.text_handler = Some(Arc::new(f));
        self
    }

    /// Filtered event handler. `"message"` and `"message_created"` set the
    /// generic message handler instead.
    pub fn on<F>(mut self, filter: impl Into<EventFilter>, f: F) -> Self
    where
        F: for<'a> Fn(&'a mut UpdateContext) -> BoxFuture<'a, Result<()>> + Send + Sync + 'static,
    {
        let filter = filter.into();
        let handler: Handler = Arc::new(f);
        if filter.is_generic_message() {
            self.message_handler = Some(handler);
        } else {
            self.events.push((filter, handler));
        }
        self
    }

    pub fn on_message<F>(self, f: F) -> Self
    where
        F: for<'a> Fn(&'a mut UpdateContext) -> BoxFuture<'a, Result<()>> + Send + Sync + 'static,
    {
        self.on("message", f)
    }

    pub async fn handle_enter(&self, ctx: &mut UpdateContext) -> Result<()> {
        if let Some(hook) = &self.enter_handler {
            hook(ctx).await?;
        }
        Ok(())
    }

    pub async fn handle_leave(&self, ctx: &mut UpdateContext) -> Result<()> {
        if let Some(hook) = &self.leave_handler {
            hook(ctx).await?;
        }
        Ok(())
    }

    /// First action whose trigger matches `data`
    fn find_action(&self, data: &str) -> Option<(&ActionHandler, CallbackMatch)> {
        self.actions.iter().find_map(|(trigger, handler)| {
            trigger.captures(data).map(|groups| {
                (
                    handler,
                    CallbackMatch {
                        data: data.to_string(),
                        groups,
                    },
                )
            })
        })
    }

    pub fn has_action(&self, data: &str) -> bool {
        self.actions.iter().any(|(trigger, _)| trigger.is_match(data))
    }

    /// Run the first action matching `data`; `false` when none did
    pub async fn handle_action(&self, ctx: &mut UpdateContext, data: &str) -> Result<bool> {
        match self.find_action(data) {
            Some((handler, matched)) => {
                debug!(scene = %self.id, data = data, "Callback action matched");
                handler(ctx, matched).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Route one update; `true` when a handler consumed it
    pub async fn handle_update(&self, ctx: &mut UpdateContext) -> Result<bool> {
        let text = ctx.text().map(str::to_owned);
        let callback = ctx.callback_data().map(str::to_owned);

        if let Some(data) = callback.as_deref() {
            if self.handle_action(ctx, data).await? {
                return Ok(true);
            }
            debug!(scene = %self.id, data = data, "No action for callback");
        }

        if let Some(text) = text.as_deref() {
            if let Some(start) = self.commands.get("start") {
                if text.starts_with("/start") {
                    debug!(scene = %self.id, "Start command");
                    start(ctx).await?;
                    return Ok(true);
                }
            }

            if let Some(name) = parse_command(text) {
                match self.commands.get(name) {
                    Some(handler) => {
                        debug!(scene = %self.id, command = name, "Command matched");
                        handler(ctx).await?;
                        return Ok(true);
                    }
                    None => debug!(scene = %self.id, command = name, "Unknown command"),
                }
            }

            if let Some((trigger, handler)) = self.hears.iter().find(|(t, _)| t.is_match(text)) {
                debug!(scene = %self.id, trigger = %trigger, "Text trigger matched");
                handler(ctx).await?;
                return Ok(true);
            }

            if let Some(handler) = &self.text_handler {
                handler(ctx).await?;
                return Ok(true);
            }
        }

        if self.run_predicates(ctx).await? {
            return Ok(true);
        }

        if ctx.update().message.is_some() {
            if let Some(handler) = &self.message_handler {
                handler(ctx).await?;
                return Ok(true);
            }
        }

        if self.run_predicates(ctx).await? {
            return Ok(true);
        }

        let tag = ctx.update().kind.as_str().to_string();
        for (filter, handler) in &self.events {
            if let EventFilter::UpdateType(wanted) = filter {
                if tag == *wanted || tag == format!("message_{}", wanted) {
                    handler(ctx).await?;
                    return Ok(true);
                }
            }
        }

        let text = text.unwrap_or_default();
        for (filter, handler) in &self.events {
            if let EventFilter::TextPattern(re) = filter {
                if re.is_match(&text) {
                    handler(ctx).await?;
                    return Ok(true);
                }
            }
        }

        Ok(false)
    }

    async fn run_predicates(&self, ctx: &mut UpdateContext) -> Result<bool> {
        for (filter, handler) in &self.events {
            if let EventFilter::Predicate(predicate) = filter {
                if predicate(&*ctx) {
                    handler(ctx).await?;
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut commands: Vec<&String> = self.commands.keys().collect();
        commands.sort();
        f.debug_struct("Scene")
            .field("id", &self.id)
            .field("ttl", &self.ttl)
            .field("commands", &commands)
            .field("actions", &self.actions.iter().map(|(t, _)| t.to_string()).collect::<Vec<_>>())
            .field("events", &self.events.iter().map(|(f, _)| f).collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::test_support::RecordingApi;
    use crate::models::{Update, UpdateKind};

    fn ctx_for(update: Update) -> (UpdateContext, Arc<RecordingApi>) {
        let api = Arc::new(RecordingApi::default());
        (UpdateContext::new(update, api.clone()), api)
    }

    fn replying(scene: Scene, marker: &'static str) -> Scene {
        scene.text(move |ctx| Box::pin(async move {
            ctx.reply(marker).await?;
            Ok(())
        }))
    }

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("/help me"), Some("help"));
        assert_eq!(parse_command("/start@bot"), Some("start"));
        assert_eq!(parse_command("help"), None);
        assert_eq!(parse_command("/"), None);
    }

    #[test]
    fn test_trigger_matching() {
        let exact = Trigger::from("menu");
        assert!(exact.is_match("menu"));
        assert!(!exact.is_match("menu2"));

        let pattern = Trigger::from(Regex::new(r"^qty:(\d+)$").unwrap());
        let groups = pattern.captures("qty:12").unwrap();
        assert_eq!(groups, vec![Some("qty:12".to_string()), Some("12".to_string())]);
        assert!(pattern.captures("qty:x").is_none());
    }

    #[tokio::test]
    async fn test_action_receives_captures() {
        let scene = Scene::new("order").action(Regex::new(r"^qty:(\d+)$").unwrap(), |ctx, m| {
            Box::pin(async move {
                let qty = m.group(1).unwrap_or("?").to_string();
                ctx.reply(format!("qty={}", qty)).await?;
                Ok(())
            })
        });

        let (mut ctx, api) = ctx_for(Update::callback_query(1, 1, "qty:3"));
        assert!(scene.handle_update(&mut ctx).await.unwrap());
        assert_eq!(api.texts().await, vec!["qty=3"]);
    }

    #[tokio::test]
    async fn test_duplicate_exact_action_replaces_handler() {
        let scene = Scene::new("s")
            .action("a", |ctx, _| Box::pin(async move { ctx.reply("first").await.map(|_| ()) }))
            .action("a", |ctx, _| Box::pin(async move { ctx.reply("second").await.map(|_| ()) }));

        let (mut ctx, api) = ctx_for(Update::callback_query(1, 1, "a"));
        assert!(scene.handle_update(&mut ctx).await.unwrap());
        assert_eq!(api.texts().await, vec!["second"]);
    }

    #[tokio::test]
    async fn test_unmatched_callback_falls_through_to_filters() {
        let scene = Scene::new("s").on("callback_query", |ctx| {
            Box::pin(async move { ctx.reply("filter").await.map(|_| ()) })
        });

        let (mut ctx, api) = ctx_for(Update::callback_query(1, 1, "unknown"));
        assert!(scene.handle_update(&mut ctx).await.unwrap());
        assert_eq!(api.texts().await, vec!["filter"]);
    }

    #[tokio::test]
    async fn test_start_prefix_beats_commands() {
        let scene = Scene::new("s")
            .start(|ctx| Box::pin(async move { ctx.reply("start").await.map(|_| ()) }))
            .command("startx", |ctx| Box::pin(async move { ctx.reply("startx").await.map(|_| ()) }));

        let (mut ctx, api) = ctx_for(Update::text_message(1, 1, "/startx"));
        assert!(scene.handle_update(&mut ctx).await.unwrap());
        assert_eq!(api.texts().await, vec!["start"]);
    }

    #[tokio::test]
    async fn test_unknown_command_reaches_text_handler() {
        let scene = replying(Scene::new("s"), "text");

        let (mut ctx, api) = ctx_for(Update::text_message(1, 1, "/nope"));
        assert!(scene.handle_update(&mut ctx).await.unwrap());
        assert_eq!(api.texts().await, vec!["text"]);
    }

    #[tokio::test]
    async fn test_hears_before_free_text() {
        let scene = replying(Scene::new("s"), "text")
            .hears(Regex::new(r"(?i)hello").unwrap(), |ctx| {
                Box::pin(async move { ctx.reply("hears").await.map(|_| ()) })
            });

        let (mut ctx, api) = ctx_for(Update::text_message(1, 1, "well HELLO there"));
        assert!(scene.handle_update(&mut ctx).await.unwrap());

        let (mut other, other_api) = ctx_for(Update::text_message(1, 1, "bye"));
        assert!(scene.handle_update(&mut other).await.unwrap());

        assert_eq!(api.texts().await, vec!["hears"]);
        assert_eq!(other_api.texts().await, vec!["text"]);
    }

    #[tokio::test]
    async fn test_string_hears_is_exact() {
        let scene = Scene::new("s").hears("yes", |ctx| {
            Box::pin(async move { ctx.reply("confirmed").await.map(|_| ()) })
        });

        let (mut exact, exact_api) = ctx_for(Update::text_message(1, 1, "yes"));
        assert!(scene.handle_update(&mut exact).await.unwrap());
        assert_eq!(exact_api.texts().await, vec!["confirmed"]);

        // Without a free-text handler other text stays unhandled
        let (mut other, other_api) = ctx_for(Update::text_message(1, 1, "yes please"));
        assert!(!scene.handle_update(&mut other).await.unwrap());
        assert!(other_api.texts().await.is_empty());
    }

    #[tokio::test]
    async fn test_on_message_registers_generic_handler() {
        let scene = Scene::new("s").on("message_created", |ctx| {
            Box::pin(async move { ctx.reply("message").await.map(|_| ()) })
        });

        let mut update = Update::text_message(1, 1, "ignored");
        update.message.as_mut().unwrap().text = None;
        let (mut ctx, api) = ctx_for(update);
        assert!(scene.handle_update(&mut ctx).await.unwrap());
        assert_eq!(api.texts().await, vec!["message"]);
    }

    #[tokio::test]
    async fn test_update_type_filter_matches_prefixed_tag() {
        let scene = Scene::new("s").on("photo", |ctx| {
            Box::pin(async move { ctx.reply("photo").await.map(|_| ()) })
        });

        let mut update = Update::text_message(1, 1, "");
        update.kind = UpdateKind::Other("message_photo".to_string());
        let (mut ctx, api) = ctx_for(update);
        assert!(scene.handle_update(&mut ctx).await.unwrap());
        assert_eq!(api.texts().await, vec!["photo"]);
    }

    #[tokio::test]
    async fn test_nothing_matches() {
        let scene = Scene::new("s").command("help", |ctx| {
            Box::pin(async move { ctx.reply("help").await.map(|_| ()) })
        });

        let (mut ctx, api) = ctx_for(Update::text_message(1, 1, "just text"));
        assert!(!scene.handle_update(&mut ctx).await.unwrap());
        assert!(api.texts().await.is_empty());
    }

    #[tokio::test]
    async fn test_handler_error_propagates() {
        let scene = Scene::new("s").text(|_ctx| {
            Box::pin(async move { Err(crate::utils::errors::BridgeError::Handler("boom".into())) })
        });

        let (mut ctx, _api) = ctx_for(Update::text_message(1, 1, "x"));
        assert!(scene.handle_update(&mut ctx).await.is_err());
    }
}
