use std::collections::HashMap;

// ═══════════════════════════════════════════════════════════════════════════════
// CHANNELS
// ═══════════════════════════════════════════════════════════════════════════════

/// Named stream that entries of one category are published on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Name,
    Description,
    Keywords,
    Model,
    Prop,
    Data,
    Computed,
    Method,
    Event,
    Slot,
    /// Fires once after every other channel has finished.
    End,
}

impl Channel {
    pub const CATEGORIES: [Channel; 10] = [
        Channel::Name,
        Channel::Description,
        Channel::Keywords,
        Channel::Model,
        Channel::Prop,
        Channel::Data,
        Channel::Computed,
        Channel::Method,
        Channel::Event,
        Channel::Slot,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Name => "name",
            Channel::Description => "description",
            Channel::Keywords => "keywords",
            Channel::Model => "model",
            Channel::Prop => "prop",
            Channel::Data => "data",
            Channel::Computed => "computed",
            Channel::Method => "method",
            Channel::Event => "event",
            Channel::Slot => "slot",
            Channel::End => "end",
        }
    }

    /// Accepts both singular and plural category names.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "name" => Some(Channel::Name),
            "description" => Some(Channel::Description),
            "keywords" => Some(Channel::Keywords),
            "model" => Some(Channel::Model),
            "prop" | "props" => Some(Channel::Prop),
            "data" => Some(Channel::Data),
            "computed" => Some(Channel::Computed),
            "method" | "methods" => Some(Channel::Method),
            "event" | "events" => Some(Channel::Event),
            "slot" | "slots" => Some(Channel::Slot),
            "end" => Some(Channel::End),
            _ => None,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DISPATCH
// ═══════════════════════════════════════════════════════════════════════════════

/// What a listener receives for one dispatch.
pub struct EntryEvent<'e, P> {
    channel: Channel,
    payload: Option<&'e P>,
    stopped: bool,
}

impl<'e, P> EntryEvent<'e, P> {
    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// `None` only for [`Channel::End`].
    pub fn entry(&self) -> Option<&'e P> {
        self.payload
    }

    /// Skips the remaining listeners of this channel for this entry only.
    pub fn stop_immediate_propagation(&mut self) {
        self.stopped = true;
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.stopped
    }
}

pub type Listener<'l, P> = Box<dyn FnMut(&mut EntryEvent<'_, P>) + 'l>;

/// Per-channel ordered listener lists.
pub struct Dispatcher<'l, P> {
    listeners: HashMap<Channel, Vec<Listener<'l, P>>>,
}

impl<'l, P> Default for Dispatcher<'l, P> {
    fn default() -> Self {
        Self {
            listeners: HashMap::new(),
        }
    }
}

impl<'l, P> Dispatcher<'l, P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<F>(&mut self, channel: Channel, listener: F)
    where
        F: FnMut(&mut EntryEvent<'_, P>) + 'l,
    {
        self.listeners
            .entry(channel)
            .or_default()
            .push(Box::new(listener));
    }

    /// Invokes the listeners of `channel` in registration order and returns
    /// how many ran.
    pub fn dispatch(&mut self, channel: Channel, payload: Option<&P>) -> usize {
        let Some(listeners) = self.listeners.get_mut(&channel) else {
            return 0;
        };
        let mut event = EntryEvent {
            channel,
            payload,
            stopped: false,
        };
        let mut invoked = 0;
        for listener in listeners.iter_mut() {
            listener(&mut event);
            invoked += 1;
            if event.stopped {
                break;
            }
        }
        invoked
    }

    pub fn end(&mut self) -> usize {
        self.dispatch(Channel::End, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_listeners_fire_in_registration_order() {
        let log = RefCell::new(Vec::new());
        let mut dispatcher: Dispatcher<'_, String> = Dispatcher::new();
        dispatcher.on(Channel::Prop, |e| log.borrow_mut().push(format!("a:{}", e.entry().unwrap())));
        dispatcher.on(Channel::Prop, |e| log.borrow_mut().push(format!("b:{}", e.entry().unwrap())));
        let payload = "x".to_string();
        assert_eq!(dispatcher.dispatch(Channel::Prop, Some(&payload)), 2);
        drop(dispatcher);
        assert_eq!(log.into_inner(), vec!["a:x", "b:x"]);
    }

    #[test]
    fn test_stop_immediate_propagation_is_per_dispatch() {
        let count = RefCell::new(0);
        let mut dispatcher: Dispatcher<'_, u32> = Dispatcher::new();
        dispatcher.on(Channel::Event, |e| {
            if e.entry() == Some(&1) {
                e.stop_immediate_propagation();
            }
        });
        dispatcher.on(Channel::Event, |_| *count.borrow_mut() += 1);

        assert_eq!(dispatcher.dispatch(Channel::Event, Some(&1)), 1);
        assert_eq!(dispatcher.dispatch(Channel::Event, Some(&2)), 2);
        drop(dispatcher);
        assert_eq!(count.into_inner(), 1);
    }

    #[test]
    fn test_end_has_no_payload() {
        let mut seen = None;
        {
            let mut dispatcher: Dispatcher<'_, u32> = Dispatcher::new();
            dispatcher.on(Channel::End, |e| seen = Some(e.entry().is_none()));
            assert_eq!(dispatcher.end(), 1);
        }
        assert_eq!(seen, Some(true));
    }

    #[test]
    fn test_channel_aliases() {
        assert_eq!(Channel::parse("props"), Some(Channel::Prop));
        assert_eq!(Channel::parse("slots"), Some(Channel::Slot));
        assert_eq!(Channel::parse("bogus"), None);
    }
}
