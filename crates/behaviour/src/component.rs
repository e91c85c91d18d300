use crate::behaviour::{Behaviour, BehaviourError};
use crate::scene::SceneHandle;
use std::any::Any;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// A leaf behaviour that can be looked up by key and downcast by siblings.
pub trait MonoBehaviour: Behaviour + Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Behaviour + 'static> MonoBehaviour for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A started component as stored by its scene object.
pub type ComponentRef = Rc<RefCell<Box<dyn MonoBehaviour>>>;

/// Builds one component from its context.
pub type ComponentFactory =
    Rc<dyn Fn(ComponentContext) -> Result<Box<dyn MonoBehaviour>, BehaviourError>>;

/// Wrap a constructor closure as a [`ComponentFactory`].
pub fn factory<T, F>(build: F) -> ComponentFactory
where
    T: MonoBehaviour,
    F: Fn(ComponentContext) -> Result<T, BehaviourError> + 'static,
{
    Rc::new(move |ctx| Ok(Box::new(build(ctx)?) as Box<dyn MonoBehaviour>))
}

/// Instantiated components of one scene object, in declaration order.
#[derive(Default)]
pub struct ComponentTable {
    entries: RefCell<Vec<(String, ComponentRef)>>,
}

impl std::fmt::Debug for ComponentTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.keys()).finish()
    }
}

impl ComponentTable {
    pub fn get(&self, key: &str) -> Option<ComponentRef> {
        self.entries
            .borrow()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, c)| c.clone())
    }

    /// Store `component` under `key`, replacing an existing entry in place.
    pub fn insert(&self, key: &str, component: ComponentRef) {
        let mut entries = self.entries.borrow_mut();
        match entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = component,
            None => entries.push((key.to_string(), component)),
        }
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries.borrow().iter().map(|(k, _)| k.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    /// Cloned handles, so callers can iterate while components look each
    /// other up.
    pub fn snapshot(&self) -> Vec<(String, ComponentRef)> {
        self.entries.borrow().clone()
    }
}

/// What a component is constructed with: its key plus back-references to
/// the owning scene object's table and the shared scene. Neither is owned.
#[derive(Clone)]
pub struct ComponentContext {
    key: String,
    parent: Weak<ComponentTable>,
    scene: Weak<SceneHandle>,
}

impl std::fmt::Debug for ComponentContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentContext")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl ComponentContext {
    pub fn new(key: &str, parent: Weak<ComponentTable>, scene: Weak<SceneHandle>) -> Self {
        Self {
            key: key.to_string(),
            parent,
            scene,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The sibling stored under `key`.
    ///
    /// Siblings declared later than the caller are not instantiated yet while
    /// the caller starts, so this returns `None` for them.
    pub fn get_component(&self, key: &str) -> Option<ComponentRef> {
        self.parent.upgrade()?.get(key)
    }

    /// Borrow the sibling under `key` as a `T` and run `f` on it.
    ///
    /// `None` when the sibling is absent, is another type, or is mutably
    /// borrowed (a component looking itself up).
    pub fn with_component<T: 'static, R>(&self, key: &str, f: impl FnOnce(&T) -> R) -> Option<R> {
        let component = self.get_component(key)?;
        let guard = component.try_borrow().ok()?;
        let behaviour: &dyn MonoBehaviour = &**guard;
        behaviour.as_any().downcast_ref::<T>().map(f)
    }

    /// Like [`with_component`](Self::with_component), failing with
    /// `MissingComponent` instead of returning `None`.
    pub fn require_component<T: 'static, R>(
        &self,
        key: &str,
        f: impl FnOnce(&T) -> R,
    ) -> Result<R, BehaviourError> {
        self.with_component(key, f)
            .ok_or_else(|| BehaviourError::MissingComponent(key.to_string()))
    }

    pub fn scene(&self) -> Result<Rc<SceneHandle>, BehaviourError> {
        self.scene.upgrade().ok_or(BehaviourError::SceneGone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter(u32);
    impl Behaviour for Counter {}

    fn boxed(n: u32) -> ComponentRef {
        Rc::new(RefCell::new(Box::new(Counter(n))))
    }

    #[test]
    fn table_keeps_order_and_replaces_in_place() {
        let table = ComponentTable::default();
        table.insert("a", boxed(1));
        table.insert("b", boxed(2));
        table.insert("a", boxed(3));
        assert_eq!(table.keys(), vec!["a", "b"]);
        let a = table.get("a").unwrap();
        let value = a.borrow().as_any().downcast_ref::<Counter>().map(|c| c.0);
        assert_eq!(value, Some(3));
    }

    #[test]
    fn context_resolves_siblings_by_type() {
        let table = Rc::new(ComponentTable::default());
        table.insert("count", boxed(7));
        let ctx = ComponentContext::new("reader", Rc::downgrade(&table), Weak::new());

        assert_eq!(ctx.with_component::<Counter, _>("count", |c| c.0), Some(7));
        assert_eq!(ctx.with_component::<String, _>("count", |s| s.len()), None);
        assert!(ctx.get_component("missing").is_none());
        assert!(matches!(
            ctx.require_component::<Counter, _>("missing", |c| c.0),
            Err(BehaviourError::MissingComponent(k)) if k == "missing"
        ));
    }

    #[test]
    fn borrowed_component_is_not_visible() {
        let table = Rc::new(ComponentTable::default());
        let own = boxed(1);
        table.insert("self", own.clone());
        let ctx = ComponentContext::new("self", Rc::downgrade(&table), Weak::new());
        let _guard = own.borrow_mut();
        assert_eq!(ctx.with_component::<Counter, _>("self", |c| c.0), None);
    }

    #[test]
    fn dropped_owners_are_reported() {
        let table = Rc::new(ComponentTable::default());
        table.insert("count", boxed(1));
        let ctx = ComponentContext::new("reader", Rc::downgrade(&table), Weak::new());
        drop(table);
        assert!(ctx.get_component("count").is_none());
        assert!(matches!(ctx.scene(), Err(BehaviourError::SceneGone)));
    }
}
