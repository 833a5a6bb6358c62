use crate::emitter::{Channel, Dispatcher};
use crate::entry::{Entry, Visibility};
use crate::validate::{Diagnostic, FeatureSet};
use std::collections::HashSet;

/// State confined to a single analysis run.
///
/// Every extractor publishes through [`AnalysisContext::emit`], which applies
/// feature gating, visibility filtering and name deduplication before handing
/// the entry to the listeners.
pub struct AnalysisContext<'l> {
    dispatcher: Dispatcher<'l, Entry>,
    features: FeatureSet,
    ignored_visibilities: HashSet<Visibility>,
    emitted_events: HashSet<String>,
    emitted_slots: HashSet<String>,
    name_emitted: bool,
    diagnostics: Vec<Diagnostic>,
}

impl<'l> AnalysisContext<'l> {
    pub fn new(
        dispatcher: Dispatcher<'l, Entry>,
        features: FeatureSet,
        ignored_visibilities: HashSet<Visibility>,
    ) -> Self {
        Self {
            dispatcher,
            features,
            ignored_visibilities,
            emitted_events: HashSet::new(),
            emitted_slots: HashSet::new(),
            name_emitted: false,
            diagnostics: Vec::new(),
        }
    }

    pub fn is_enabled(&self, channel: Channel) -> bool {
        self.features.contains(channel)
    }

    /// Publishes `entry` unless it is filtered out. Returns whether it was
    /// dispatched.
    pub fn emit(&mut self, entry: Entry) -> bool {
        let channel = entry.channel();
        if !self.features.contains(channel) {
            return false;
        }
        if self.ignored_visibilities.contains(&entry.visibility()) {
            tracing::trace!(channel = channel.as_str(), "entry filtered by visibility");
            return false;
        }
        match &entry {
            Entry::Event(event) => {
                if !self.emitted_events.insert(event.member.name.clone()) {
                    return false;
                }
            }
            Entry::Slot(slot) => {
                if !self.emitted_slots.insert(slot.member.name.clone()) {
                    return false;
                }
            }
            Entry::Name { .. } => {
                if self.name_emitted {
                    return false;
                }
                self.name_emitted = true;
            }
            _ => {}
        }
        tracing::trace!(
            channel = channel.as_str(),
            name = entry.member().map(|m| m.name.as_str()).unwrap_or(""),
            "dispatching entry"
        );
        self.dispatcher.dispatch(channel, Some(&entry));
        true
    }

    pub fn warn(&mut self, diagnostic: Diagnostic) {
        tracing::warn!(code = %diagnostic.code, "{}", diagnostic.message);
        self.diagnostics.push(diagnostic);
    }

    /// Fires `end` and hands back the listeners and collected diagnostics.
    pub fn finish(mut self) -> (Dispatcher<'l, Entry>, Vec<Diagnostic>) {
        self.dispatcher.end();
        (self.dispatcher, self.diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{EventEntry, Member};
    use std::cell::RefCell;

    fn event(name: &str, visibility: Visibility) -> Entry {
        Entry::Event(EventEntry {
            member: Member {
                visibility,
                ..Member::named(name)
            },
            arguments: vec![],
        })
    }

    #[test]
    fn test_event_names_dedupe_after_visibility_filter() {
        let names = RefCell::new(Vec::new());
        let mut dispatcher: Dispatcher<'_, Entry> = Dispatcher::new();
        dispatcher.on(Channel::Event, |e| {
            if let Some(Entry::Event(ev)) = e.entry() {
                names.borrow_mut().push(ev.member.name.clone());
            }
        });
        let ignored = [Visibility::Private].into_iter().collect();
        let mut ctx = AnalysisContext::new(dispatcher, FeatureSet::all(), ignored);

        assert!(!ctx.emit(event("save", Visibility::Private)));
        assert!(ctx.emit(event("save", Visibility::Public)));
        assert!(!ctx.emit(event("save", Visibility::Public)));
        drop(ctx.finish());
        assert_eq!(names.into_inner(), vec!["save"]);
    }

    #[test]
    fn test_disabled_feature_is_not_dispatched() {
        let mut ctx = AnalysisContext::new(
            Dispatcher::new(),
            FeatureSet::from_names(&["props"]).unwrap(),
            HashSet::new(),
        );
        assert!(!ctx.emit(event("save", Visibility::Public)));
        assert!(ctx.emitted_events.is_empty());
    }
}
