//! Shared component fixtures for engine tests.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::description::{Component, ComponentContext, Description, Updater};
use crate::store::Store;

use super::animation::{AnimationSpec, ChildrenAnimation};

// =============================================================================
// Store
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct AppState {
    pub count: i32,
}

#[derive(Clone, Copy, Debug)]
pub(crate) enum AppAction {
    Increment,
}

pub(crate) fn reduce(state: &AppState, action: &AppAction) -> AppState {
    match action {
        AppAction::Increment => AppState {
            count: state.count + 1,
        },
    }
}

pub(crate) fn test_store() -> Rc<Store<AppState, AppAction>> {
    Store::new(AppState::default(), reduce)
}

pub(crate) type Desc = Description<AppState, AppAction>;

// =============================================================================
// Views
// =============================================================================

/// The only native view fixtures use: a text plus an opacity channel the
/// entry/exit transforms can drive.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct TextView {
    pub text: String,
    pub alpha: f32,
}

impl Default for TextView {
    fn default() -> Self {
        Self {
            text: String::new(),
            alpha: 1.0,
        }
    }
}

// =============================================================================
// Label
// =============================================================================

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct LabelProps {
    pub text: String,
    pub alpha: f32,
}

impl LabelProps {
    pub(crate) fn text(text: &str) -> Self {
        Self {
            text: text.into(),
            alpha: 1.0,
        }
    }
}

pub(crate) struct Label;

impl Component<AppState, AppAction> for Label {
    type Props = LabelProps;
    type State = ();

    fn make_view() -> Box<dyn Any> {
        Box::new(TextView::default())
    }

    fn children(
        _props: &LabelProps,
        _state: &(),
        _ctx: &ComponentContext<AppAction, ()>,
    ) -> Vec<Desc> {
        Vec::new()
    }

    fn apply(view: &mut dyn Any, props: &LabelProps, _state: &(), _ctx: &ComponentContext<AppAction, ()>) {
        let view = view.downcast_mut::<TextView>().unwrap();
        view.text = props.text.clone();
        view.alpha = props.alpha;
    }
}

pub(crate) fn label(text: &str) -> Desc {
    Description::new::<Label>(LabelProps::text(text))
}

/// A `Label` description faded out, the shape entry/exit transforms
/// produce in the animation fixtures.
pub(crate) fn faded(description: Desc) -> Desc {
    description.map_props::<Label>(|mut props| {
        props.alpha = 0.0;
        props
    })
}

// =============================================================================
// Row
// =============================================================================

/// Parent whose children are labels derived from `(key, text)` pairs.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct RowProps {
    pub labels: Vec<(Option<String>, String)>,
}

fn label_children(props: &RowProps) -> Vec<Desc> {
    props
        .labels
        .iter()
        .map(|(key, text)| {
            let description = label(text);
            match key {
                Some(key) => description.with_key(key.clone()),
                None => description,
            }
        })
        .collect()
}

pub(crate) struct Row;

impl Component<AppState, AppAction> for Row {
    type Props = RowProps;
    type State = ();

    fn make_view() -> Box<dyn Any> {
        Box::new(TextView::default())
    }

    fn children(
        props: &RowProps,
        _state: &(),
        _ctx: &ComponentContext<AppAction, ()>,
    ) -> Vec<Desc> {
        label_children(props)
    }

    fn apply(view: &mut dyn Any, _props: &RowProps, _state: &(), _ctx: &ComponentContext<AppAction, ()>) {
        view.downcast_mut::<TextView>().unwrap().text = "row".into();
    }
}

pub(crate) fn row(labels: &[(Option<&str>, &str)]) -> Desc {
    Description::new::<Row>(RowProps {
        labels: labels
            .iter()
            .map(|(key, text)| (key.map(String::from), String::from(*text)))
            .collect(),
    })
}

/// `Row` variant that animates children changes: labels fade in from and
/// out to alpha 0 over a fixed native duration.
pub(crate) struct AnimRow;

impl Component<AppState, AppAction> for AnimRow {
    type Props = RowProps;
    type State = ();

    fn make_view() -> Box<dyn Any> {
        Box::new(TextView::default())
    }

    fn children(
        props: &RowProps,
        _state: &(),
        _ctx: &ComponentContext<AppAction, ()>,
    ) -> Vec<Desc> {
        label_children(props)
    }

    fn apply(view: &mut dyn Any, _props: &RowProps, _state: &(), _ctx: &ComponentContext<AppAction, ()>) {
        view.downcast_mut::<TextView>().unwrap().text = "row".into();
    }

    fn children_animation(
        current: &RowProps,
        next: &RowProps,
        _current_state: &(),
        _next_state: &(),
        parent: Option<&AnimationSpec>,
    ) -> ChildrenAnimation<AppState, AppAction> {
        if current == next {
            return ChildrenAnimation::none();
        }
        let spec = parent
            .copied()
            .unwrap_or_else(|| AnimationSpec::new(Duration::from_millis(150)));
        ChildrenAnimation::transition(
            spec,
            vec![Rc::new(faded)],
            vec![Rc::new(faded)],
        )
    }
}

pub(crate) fn anim_row(labels: &[(Option<&str>, &str)]) -> Desc {
    Description::new::<AnimRow>(RowProps {
        labels: labels
            .iter()
            .map(|(key, text)| (key.map(String::from), String::from(*text)))
            .collect(),
    })
}

// =============================================================================
// Counter
// =============================================================================

/// Side channel a test uses to capture a component's state updater.
pub(crate) type Probe = Rc<RefCell<Option<Updater<u32>>>>;

#[derive(Clone)]
pub(crate) struct CounterProps {
    pub name: String,
    pub probe: Probe,
}

impl PartialEq for CounterProps {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

/// Stateful leaf: view text is `name:state`, and `apply` publishes the
/// typed updater through the probe.
pub(crate) struct Counter;

impl Component<AppState, AppAction> for Counter {
    type Props = CounterProps;
    type State = u32;

    fn make_view() -> Box<dyn Any> {
        Box::new(TextView::default())
    }

    fn children(
        _props: &CounterProps,
        _state: &u32,
        _ctx: &ComponentContext<AppAction, u32>,
    ) -> Vec<Desc> {
        Vec::new()
    }

    fn apply(
        view: &mut dyn Any,
        props: &CounterProps,
        state: &u32,
        ctx: &ComponentContext<AppAction, u32>,
    ) {
        *props.probe.borrow_mut() = Some(ctx.updater());
        view.downcast_mut::<TextView>().unwrap().text = format!("{}:{}", props.name, state);
    }
}

pub(crate) fn counter(name: &str, probe: &Probe) -> Desc {
    Description::new::<Counter>(CounterProps {
        name: name.into(),
        probe: probe.clone(),
    })
}

/// Parent whose children are keyed counters, one per `(name, probe)` entry.
#[derive(Clone)]
pub(crate) struct CounterRowProps {
    pub entries: Vec<(String, Probe)>,
}

impl PartialEq for CounterRowProps {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .zip(&other.entries)
                .all(|((a, _), (b, _))| a == b)
    }
}

pub(crate) struct CounterRow;

impl Component<AppState, AppAction> for CounterRow {
    type Props = CounterRowProps;
    type State = ();

    fn make_view() -> Box<dyn Any> {
        Box::new(TextView::default())
    }

    fn children(
        props: &CounterRowProps,
        _state: &(),
        _ctx: &ComponentContext<AppAction, ()>,
    ) -> Vec<Desc> {
        props
            .entries
            .iter()
            .map(|(name, probe)| counter(name, probe).with_key(name.clone()))
            .collect()
    }

    fn apply(view: &mut dyn Any, _props: &CounterRowProps, _state: &(), _ctx: &ComponentContext<AppAction, ()>) {
        view.downcast_mut::<TextView>().unwrap().text = "row".into();
    }
}

pub(crate) fn counter_row(entries: &[(&str, &Probe)]) -> Desc {
    Description::new::<CounterRow>(CounterRowProps {
        entries: entries
            .iter()
            .map(|(name, probe)| (String::from(*name), (*probe).clone()))
            .collect(),
    })
}

// =============================================================================
// Connected Label
// =============================================================================

/// Store-connected leaf: text mirrors the store's counter.
pub(crate) struct ConnectedLabel;

impl Component<AppState, AppAction> for ConnectedLabel {
    type Props = LabelProps;
    type State = ();

    fn make_view() -> Box<dyn Any> {
        Box::new(TextView::default())
    }

    fn children(
        _props: &LabelProps,
        _state: &(),
        _ctx: &ComponentContext<AppAction, ()>,
    ) -> Vec<Desc> {
        Vec::new()
    }

    fn apply(view: &mut dyn Any, props: &LabelProps, _state: &(), _ctx: &ComponentContext<AppAction, ()>) {
        let view = view.downcast_mut::<TextView>().unwrap();
        view.text = props.text.clone();
        view.alpha = props.alpha;
    }

    fn connected() -> bool {
        true
    }

    fn connect(props: LabelProps, store_state: &AppState) -> LabelProps {
        LabelProps {
            text: store_state.count.to_string(),
            alpha: props.alpha,
        }
    }
}

/// Parent with a single store-connected child, for refresh-propagation
/// tests. Props are a dummy tag.
pub(crate) struct ConnectedRow;

impl Component<AppState, AppAction> for ConnectedRow {
    type Props = u32;
    type State = ();

    fn make_view() -> Box<dyn Any> {
        Box::new(TextView::default())
    }

    fn children(_props: &u32, _state: &(), _ctx: &ComponentContext<AppAction, ()>) -> Vec<Desc> {
        vec![Description::new::<ConnectedLabel>(LabelProps::text(""))]
    }

    fn apply(view: &mut dyn Any, _props: &u32, _state: &(), _ctx: &ComponentContext<AppAction, ()>) {
        view.downcast_mut::<TextView>().unwrap().text = "row".into();
    }
}

// =============================================================================
// Filtered Row
// =============================================================================

/// `Row` variant whose filter hook drops labels with empty text.
pub(crate) struct FilteredRow;

impl Component<AppState, AppAction> for FilteredRow {
    type Props = RowProps;
    type State = ();

    fn make_view() -> Box<dyn Any> {
        Box::new(TextView::default())
    }

    fn children(
        props: &RowProps,
        _state: &(),
        _ctx: &ComponentContext<AppAction, ()>,
    ) -> Vec<Desc> {
        label_children(props)
    }

    fn apply(view: &mut dyn Any, _props: &RowProps, _state: &(), _ctx: &ComponentContext<AppAction, ()>) {
        view.downcast_mut::<TextView>().unwrap().text = "row".into();
    }

    fn filter_children(children: Vec<Desc>, _props: &RowProps, _state: &()) -> Vec<Desc> {
        children
            .into_iter()
            .filter(|child| !child.props::<Label>().text.is_empty())
            .collect()
    }
}
