//! Binding tables: which control and trigger runs which controller action.
//!
//! Each controller publishes its table up front. At startup the table is
//! checked against the page so missing markup shows up in the logs, and at
//! runtime incoming [`PageEvent`]s are resolved through it.

use tracing::debug;

use super::Page;

/// How a binding picks out its control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    /// The element with this id.
    Id(&'static str),
    /// Any element carrying this class.
    Class(&'static str),
    /// The window itself (load/unload).
    Window,
}

impl Selector {
    /// Whether the page contains at least one element this selector matches.
    #[must_use]
    pub fn is_present(&self, page: &dyn Page) -> bool {
        match self {
            Self::Id(id) => page.exists(id),
            Self::Class(class) => !page.elements_with_class(class).is_empty(),
            Self::Window => true,
        }
    }

    fn matches(&self, page: &dyn Page, target: &Target) -> bool {
        match (self, target) {
            (Self::Id(id), Target::Element(target_id)) => *id == target_id.as_str(),
            (Self::Class(class), Target::Element(target_id)) => page.has_class(target_id, class),
            (Self::Window, Target::Window) => true,
            _ => false,
        }
    }
}

/// What an event fired on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Element(String),
    Window,
}

/// Kind of event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Click,
    Change,
    Input,
    Load,
    Unload,
}

/// An event delivered by the page host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageEvent {
    pub target: Target,
    pub trigger: Trigger,
}

impl PageEvent {
    #[must_use]
    pub fn click(id: &str) -> Self {
        Self {
            target: Target::Element(id.to_string()),
            trigger: Trigger::Click,
        }
    }

    #[must_use]
    pub fn change(id: &str) -> Self {
        Self {
            target: Target::Element(id.to_string()),
            trigger: Trigger::Change,
        }
    }

    #[must_use]
    pub fn input(id: &str) -> Self {
        Self {
            target: Target::Element(id.to_string()),
            trigger: Trigger::Input,
        }
    }

    #[must_use]
    pub const fn load() -> Self {
        Self {
            target: Target::Window,
            trigger: Trigger::Load,
        }
    }

    #[must_use]
    pub const fn unload() -> Self {
        Self {
            target: Target::Window,
            trigger: Trigger::Unload,
        }
    }

    /// Id of the element the event fired on.
    #[must_use]
    pub fn element_id(&self) -> Option<&str> {
        match &self.target {
            Target::Element(id) => Some(id),
            Target::Window => None,
        }
    }
}

/// One row of a binding table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding<A> {
    pub selector: Selector,
    pub trigger: Trigger,
    pub action: A,
}

/// Mapping from controls to controller actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingTable<A> {
    bindings: Vec<Binding<A>>,
}

impl<A> Default for BindingTable<A> {
    fn default() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }
}

impl<A: Copy + std::fmt::Debug> BindingTable<A> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a binding.
    #[must_use]
    pub fn bind(mut self, selector: Selector, trigger: Trigger, action: A) -> Self {
        self.bindings.push(Binding {
            selector,
            trigger,
            action,
        });
        self
    }

    /// All bindings, in the order they were added.
    #[must_use]
    pub fn bindings(&self) -> &[Binding<A>] {
        &self.bindings
    }

    /// Check the table against the page markup.
    ///
    /// Returns the bindings whose controls are absent. Those behaviours are
    /// skipped at runtime; this only makes the gap visible.
    pub fn validate(&self, page: &dyn Page) -> Vec<Binding<A>> {
        let missing: Vec<Binding<A>> = self
            .bindings
            .iter()
            .filter(|binding| !binding.selector.is_present(page))
            .copied()
            .collect();

        for binding in &missing {
            debug!(
                selector = ?binding.selector,
                action = ?binding.action,
                "Control missing from page markup; behaviour disabled"
            );
        }

        missing
    }

    /// Find the action bound to an event, if any.
    #[must_use]
    pub fn resolve(&self, page: &dyn Page, event: &PageEvent) -> Option<A> {
        self.bindings
            .iter()
            .find(|binding| {
                binding.trigger == event.trigger && binding.selector.matches(page, &event.target)
            })
            .map(|binding| binding.action)
    }
}
