use crate::component::{ComponentExtractor, ComponentSummary, ExportState};
use crate::context::AnalysisContext;
use crate::emitter::{Channel, Dispatcher, EntryEvent};
use crate::entry::{
    ComputedEntry, DataEntry, Entry, EventEntry, Keyword, Member, MethodEntry, ModelEntry,
    PropEntry, SlotEntry,
};
use crate::sfc::{self, Section};
use crate::template::{parse_markup, TemplateItem, TemplateScanner};
use crate::validate::{ConfigError, Diagnostic, ParserOptions, ValidatedOptions, W_SCRIPT_SYNTAX};
use oxc_allocator::Allocator;
use oxc_parser::Parser as ScriptParser;
use oxc_span::SourceType;
use serde::Serialize;
use std::cell::RefCell;
use std::collections::HashMap;

/// Documentation walker for one component file.
///
/// Listeners are registered per channel before [`Parser::walk`]; every entry
/// the walk discovers is delivered to them synchronously, and `end` fires once
/// when the walk is over.
pub struct Parser<'l> {
    options: ValidatedOptions,
    dispatcher: Dispatcher<'l, Entry>,
    diagnostics: Vec<Diagnostic>,
}

impl<'l> Parser<'l> {
    /// Validates `options` and loads the source. Nothing is analysed yet.
    pub fn new(options: ParserOptions) -> Result<Self, ConfigError> {
        Ok(Self {
            options: options.validate()?,
            dispatcher: Dispatcher::new(),
            diagnostics: Vec::new(),
        })
    }

    pub fn add_listener<F>(&mut self, channel: Channel, listener: F)
    where
        F: FnMut(&mut EntryEvent<'_, Entry>) + 'l,
    {
        self.dispatcher.on(channel, listener);
    }

    /// Same as [`Parser::add_listener`] with the channel given by name
    /// (`prop`, `props`, `end`, ...).
    pub fn add_listener_by_name<F>(&mut self, channel: &str, listener: F) -> Result<(), ConfigError>
    where
        F: FnMut(&mut EntryEvent<'_, Entry>) + 'l,
    {
        let channel =
            Channel::parse(channel).ok_or_else(|| ConfigError::UnknownFeature(channel.to_string()))?;
        self.dispatcher.on(channel, listener);
        Ok(())
    }

    /// Runs the analysis, dispatching entries as they are found, and returns
    /// the non-fatal diagnostics of this run.
    pub fn walk(&mut self) -> &[Diagnostic] {
        tracing::debug!(
            file = ?self.options.filename,
            bytes = self.options.source.len(),
            "documentation walk started"
        );

        let dispatcher = std::mem::take(&mut self.dispatcher);
        let mut ctx = AnalysisContext::new(
            dispatcher,
            self.options.features.clone(),
            self.options.ignored_visibilities.clone(),
        );
        let fallback_name = self.options.file_stem();
        let sections = sfc::split(&self.options.source);

        let summary = match &sections.script {
            Some(script) => extract_script(script, &mut ctx, fallback_name.as_deref()),
            None => ComponentSummary::default(),
        };
        if summary.export == ExportState::Missing {
            if let Some(value) = fallback_name {
                ctx.emit(Entry::Name { value });
            }
        }

        let slots = ctx.is_enabled(Channel::Slot);
        let events = ctx.is_enabled(Channel::Event);
        if slots || events {
            if let Some(template) = &sections.template {
                let nodes = parse_markup(template.content);
                for item in TemplateScanner::new(slots, events).scan(&nodes) {
                    match item {
                        TemplateItem::Slot(slot) => ctx.emit(Entry::Slot(slot)),
                        TemplateItem::Event(event) => ctx.emit(Entry::Event(event)),
                    };
                }
            }
        }
        if slots {
            for tag in summary.slot_tags {
                ctx.emit(Entry::Slot(SlotEntry {
                    member: Member {
                        description: tag.description,
                        ..Member::named(&tag.name)
                    },
                    props: Vec::new(),
                }));
            }
        }

        let (dispatcher, diagnostics) = ctx.finish();
        self.dispatcher = dispatcher;
        self.diagnostics = diagnostics;
        tracing::debug!(warnings = self.diagnostics.len(), "documentation walk finished");
        &self.diagnostics
    }

    /// Diagnostics of the most recent walk.
    pub fn warnings(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

fn script_source_type(attributes: &HashMap<String, String>) -> SourceType {
    let source_type = SourceType::default().with_module(true).with_typescript(true);
    match attributes.get("lang").map(String::as_str) {
        Some("ts") => source_type,
        _ => source_type.with_jsx(true),
    }
}

fn extract_script(
    script: &Section<'_>,
    ctx: &mut AnalysisContext<'_>,
    fallback_name: Option<&str>,
) -> ComponentSummary {
    let allocator = Allocator::default();
    let source_type = script_source_type(&script.attributes);
    let ret = ScriptParser::new(&allocator, script.content, source_type).parse();
    if let Some(first) = ret.errors.first() {
        ctx.warn(Diagnostic::at(
            W_SCRIPT_SYNTAX,
            &format!(
                "script recovered from {} syntax error(s): {}",
                ret.errors.len(),
                first
            ),
            script.content,
            0,
        ));
    }
    ComponentExtractor::new(script.content, ctx).extract(&ret.program, fallback_name)
}

// ═══════════════════════════════════════════════════════════════════════════════
// AGGREGATE API
// ═══════════════════════════════════════════════════════════════════════════════

/// Every entry of one component, grouped by category.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub keywords: Vec<Keyword>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelEntry>,
    pub props: Vec<PropEntry>,
    pub data: Vec<DataEntry>,
    pub computed: Vec<ComputedEntry>,
    pub methods: Vec<MethodEntry>,
    pub events: Vec<EventEntry>,
    pub slots: Vec<SlotEntry>,
    pub warnings: Vec<Diagnostic>,
}

impl ComponentDoc {
    fn push(&mut self, entry: &Entry) {
        match entry.clone() {
            Entry::Name { value } => self.name = Some(value),
            Entry::Description { value } => self.description = Some(value),
            Entry::Keywords { value } => self.keywords = value,
            Entry::Model(model) => self.model = Some(model),
            Entry::Prop(prop) => self.props.push(prop),
            Entry::Data(data) => self.data.push(data),
            Entry::Computed(computed) => self.computed.push(computed),
            Entry::Method(method) => self.methods.push(method),
            Entry::Event(event) => self.events.push(event),
            Entry::Slot(slot) => self.slots.push(slot),
        }
    }
}

/// Runs a full walk and collects the result.
pub fn parse_component(options: ParserOptions) -> Result<ComponentDoc, ConfigError> {
    let doc = RefCell::new(ComponentDoc::default());
    let warnings = {
        let mut parser = Parser::new(options)?;
        for channel in Channel::CATEGORIES {
            parser.add_listener(channel, |event| {
                if let Some(entry) = event.entry() {
                    doc.borrow_mut().push(entry);
                }
            });
        }
        parser.walk().to_vec()
    };
    let mut doc = doc.into_inner();
    doc.warnings = warnings;
    Ok(doc)
}
