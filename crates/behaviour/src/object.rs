use crate::behaviour::{Behaviour, BehaviourError, BehaviourKind};
use crate::component::{
    ComponentContext, ComponentFactory, ComponentRef, ComponentTable, MonoBehaviour, factory,
};
use crate::scene::SceneHandle;
use lumen_common::NodeId;
use lumen_graph::Node;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Static declaration of a scene object: its name and ordered components.
#[derive(Clone)]
pub struct SceneObjectDef {
    name: String,
    components: Vec<(String, ComponentFactory)>,
}

impl std::fmt::Debug for SceneObjectDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneObjectDef")
            .field("name", &self.name)
            .field("components", &self.keys())
            .finish()
    }
}

impl SceneObjectDef {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            components: Vec::new(),
        }
    }

    /// Declare a component. Redeclaring a key replaces the earlier factory
    /// but keeps its position.
    pub fn component(mut self, key: &str, factory: ComponentFactory) -> Self {
        match self.components.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = factory,
            None => self.components.push((key.to_string(), factory)),
        }
        self
    }

    /// Declare a component from a typed constructor.
    pub fn with<T, F>(self, key: &str, build: F) -> Self
    where
        T: MonoBehaviour,
        F: Fn(ComponentContext) -> Result<T, BehaviourError> + 'static,
    {
        self.component(key, factory(build))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn keys(&self) -> Vec<&str> {
        self.components.iter().map(|(k, _)| k.as_str()).collect()
    }
}

/// Composite behaviour: owns its components and exports their nodes under
/// a single group.
pub struct SceneObject {
    def: SceneObjectDef,
    components: Rc<ComponentTable>,
    scene: Weak<SceneHandle>,
    group: Option<NodeId>,
}

impl std::fmt::Debug for SceneObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneObject")
            .field("name", &self.def.name)
            .field("components", &self.components)
            .field("group", &self.group)
            .finish()
    }
}

impl SceneObject {
    pub fn new(def: SceneObjectDef, scene: &Rc<SceneHandle>) -> Self {
        Self {
            def,
            components: Rc::new(ComponentTable::default()),
            scene: Rc::downgrade(scene),
            group: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.def.name
    }

    pub fn declared_keys(&self) -> Vec<&str> {
        self.def.keys()
    }

    /// Keys of instantiated components, in declaration order.
    pub fn component_keys(&self) -> Vec<String> {
        self.components.keys()
    }

    pub fn get_component(&self, key: &str) -> Option<ComponentRef> {
        self.components.get(key)
    }

    pub fn with_component<T: 'static, R>(&self, key: &str, f: impl FnOnce(&T) -> R) -> Option<R> {
        let component = self.components.get(key)?;
        let guard = component.try_borrow().ok()?;
        let behaviour: &dyn MonoBehaviour = &**guard;
        behaviour.as_any().downcast_ref::<T>().map(f)
    }

    /// Instantiate, store and start one component, then attach its exported
    /// node to this object's group.
    pub fn add_component(
        &mut self,
        key: &str,
        factory: &ComponentFactory,
    ) -> Result<(), BehaviourError> {
        self.try_add_component(key, factory)
            .map_err(|source| BehaviourError::Component {
                key: key.to_string(),
                source: Box::new(source),
            })
    }

    fn try_add_component(
        &mut self,
        key: &str,
        factory: &ComponentFactory,
    ) -> Result<(), BehaviourError> {
        let scene = self.scene()?;
        let group = self.ensure_group(&scene);

        let ctx = ComponentContext::new(key, Rc::downgrade(&self.components), self.scene.clone());
        let component: ComponentRef = Rc::new(RefCell::new(factory(ctx)?));
        self.components.insert(key, component.clone());

        component.borrow_mut().start()?;

        let exported = component.borrow().export_as_scene_object();
        if let Some(node) = exported {
            scene.graph_mut().attach(group, node)?;
        }
        tracing::debug!(
            object = %self.def.name,
            component = key,
            exported = exported.is_some(),
            "component started"
        );
        Ok(())
    }

    fn scene(&self) -> Result<Rc<SceneHandle>, BehaviourError> {
        self.scene.upgrade().ok_or(BehaviourError::SceneGone)
    }

    fn ensure_group(&mut self, scene: &SceneHandle) -> NodeId {
        let mut graph = scene.graph_mut();
        match self.group {
            Some(group) if graph.contains(group) => group,
            _ => {
                let group = graph.create(Node::group().named(&self.def.name));
                self.group = Some(group);
                group
            }
        }
    }
}

impl Behaviour for SceneObject {
    fn kind(&self) -> BehaviourKind {
        BehaviourKind::Composite
    }

    /// Reset the group to empty and add every declared component in order.
    /// The first failure aborts; components already started stay in place.
    fn start(&mut self) -> Result<(), BehaviourError> {
        let _span = tracing::debug_span!("scene_object_start", name = %self.def.name).entered();
        let scene = self.scene()?;
        if let Some(old) = self.group.take() {
            let mut graph = scene.graph_mut();
            if graph.contains(old) {
                graph.remove(old)?;
            }
        }
        self.components.clear();
        self.ensure_group(&scene);

        for (key, factory) in self.def.components.clone() {
            self.add_component(&key, &factory)?;
        }
        Ok(())
    }

    fn update(&mut self, time: f64) -> Result<(), BehaviourError> {
        for (key, component) in self.components.snapshot() {
            component
                .borrow_mut()
                .update(time)
                .map_err(|source| BehaviourError::Component {
                    key,
                    source: Box::new(source),
                })?;
        }
        Ok(())
    }

    fn export_object_group(&self) -> Option<NodeId> {
        self.group
    }
}
