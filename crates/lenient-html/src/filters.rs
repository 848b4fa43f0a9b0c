//! Push-style collaborator interface.
//!
//! The donor's design notes call for replacing an inheritance-based default
//! filter chain with a trait object vector; this is that trait.

use crate::events::Event;

/// What a filter wants done with the event it just saw.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterAction {
    /// Pass the event on to the next filter (or the final sink) unchanged.
    Continue,
    /// Drop the event; it does not reach later filters or the sink.
    Drop,
}

/// A downstream document handler in the filter chain.
///
/// Implementors see every event the balancer produces, in document order,
/// and decide whether it continues down the chain.
pub trait Filter {
    fn handle(&mut self, event: &Event) -> FilterAction {
        let _ = event;
        FilterAction::Continue
    }
}

/// Runs `event` through an ordered filter chain, returning whether it
/// survived to reach the end (i.e. no filter dropped it).
pub fn run_chain(filters: &mut [Box<dyn Filter>], event: &Event) -> bool {
    for filter in filters.iter_mut() {
        if filter.handle(event) == FilterAction::Drop {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Augmentations;

    struct DropComments;
    impl Filter for DropComments {
        fn handle(&mut self, event: &Event) -> FilterAction {
            match event {
                Event::Comment { .. } => FilterAction::Drop,
                _ => FilterAction::Continue,
            }
        }
    }

    #[test]
    fn chain_can_drop_events() {
        let mut filters: Vec<Box<dyn Filter>> = vec![Box::new(DropComments)];
        let comment = Event::Comment {
            text: "hi".into(),
            augmentations: Augmentations::default(),
        };
        assert!(!run_chain(&mut filters, &comment));
    }
}
