use crate::behaviour::{Behaviour, BehaviourError, BehaviourKind};
use crate::object::{SceneObject, SceneObjectDef};
use crate::registry::CameraRegistry;
use lumen_common::{DEFAULT_SIZE, NodeId, Size};
use lumen_graph::SceneGraph;
use lumen_input::{EventHub, InputEvent, Subscription};
use lumen_render::{Draw, PerspectiveCamera};
use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

/// State shared between a scene and every behaviour inside it.
///
/// The scene owns the only strong reference; components hold a `Weak`.
#[derive(Debug)]
pub struct SceneHandle {
    graph: RefCell<SceneGraph>,
    cameras: RefCell<CameraRegistry>,
    current_camera: RefCell<Option<String>>,
    input: RefCell<EventHub>,
}

impl Default for SceneHandle {
    fn default() -> Self {
        Self::new(CameraRegistry::new(), DEFAULT_SIZE)
    }
}

impl SceneHandle {
    pub fn new(cameras: CameraRegistry, viewport: Size) -> Self {
        Self {
            graph: RefCell::new(SceneGraph::new()),
            cameras: RefCell::new(cameras),
            current_camera: RefCell::new(None),
            input: RefCell::new(EventHub::new(viewport)),
        }
    }

    pub fn graph(&self) -> Ref<'_, SceneGraph> {
        self.graph.borrow()
    }

    pub fn graph_mut(&self) -> RefMut<'_, SceneGraph> {
        self.graph.borrow_mut()
    }

    pub fn cameras(&self) -> Ref<'_, CameraRegistry> {
        self.cameras.borrow()
    }

    pub fn cameras_mut(&self) -> RefMut<'_, CameraRegistry> {
        self.cameras.borrow_mut()
    }

    pub fn current_camera_key(&self) -> Option<String> {
        self.current_camera.borrow().clone()
    }

    /// A copy of the active camera, if one is selected.
    pub fn camera(&self) -> Option<PerspectiveCamera> {
        let key = self.current_camera.borrow();
        self.cameras.borrow().get(key.as_deref()?).copied()
    }

    /// Mutate the active camera in place. Returns `false` when none is active.
    pub fn update_camera(&self, f: impl FnOnce(&mut PerspectiveCamera)) -> bool {
        let key = self.current_camera.borrow();
        let Some(key) = key.as_deref() else {
            return false;
        };
        match self.cameras.borrow_mut().get_mut(key) {
            Some(camera) => {
                f(camera);
                true
            }
            None => false,
        }
    }

    fn select_camera(&self, key: Option<String>) {
        *self.current_camera.borrow_mut() = key;
    }

    /// Register an input listener. It must only record plain data.
    pub fn subscribe(&self, listener: impl FnMut(&InputEvent, Size) + 'static) -> Subscription {
        self.input.borrow_mut().subscribe(listener)
    }

    pub fn dispatch_input(&self, event: &InputEvent) {
        self.input.borrow_mut().dispatch(event);
    }

    pub fn viewport(&self) -> Size {
        self.input.borrow().viewport()
    }

    pub fn set_viewport(&self, viewport: Size) {
        self.input.borrow_mut().set_viewport(viewport);
    }
}

/// The drawable a scene is bound to, as seen by the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTarget {
    pub size: Size,
    pub antialias: bool,
    pub alpha: bool,
    /// The driver draws every frame. When false the scene presents its own
    /// frames from `on_after_render`.
    pub default_rendering: bool,
}

impl Default for RenderTarget {
    fn default() -> Self {
        Self {
            size: DEFAULT_SIZE,
            antialias: false,
            alpha: false,
            default_rendering: true,
        }
    }
}

/// Static declaration of a scene type.
#[derive(Debug, Clone)]
pub struct SceneDef {
    name: String,
    objects: Vec<SceneObjectDef>,
    cameras: Vec<(String, PerspectiveCamera)>,
    default_camera: String,
}

impl SceneDef {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            objects: Vec::new(),
            cameras: Vec::new(),
            default_camera: String::new(),
        }
    }

    /// Declare a scene object. A repeated name replaces the earlier one in place.
    pub fn object(mut self, def: SceneObjectDef) -> Self {
        match self.objects.iter_mut().find(|o| o.name() == def.name()) {
            Some(slot) => *slot = def,
            None => self.objects.push(def),
        }
        self
    }

    pub fn camera(mut self, name: &str, camera: PerspectiveCamera) -> Self {
        match self.cameras.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = camera,
            None => self.cameras.push((name.to_string(), camera)),
        }
        self
    }

    pub fn default_camera(mut self, key: &str) -> Self {
        self.default_camera = key.to_string();
        self
    }
}

/// Extension points a scene type overrides. All default to no-ops.
pub trait SceneHooks {
    /// Runs once while the scene is constructed, before any scene object exists.
    fn modify_scene(&mut self, _graph: &mut SceneGraph) -> Result<(), BehaviourError> {
        Ok(())
    }

    /// After the camera is resolved, before scene objects start.
    fn on_scene_awake(&mut self, _core: &mut SceneCore) -> Result<(), BehaviourError> {
        Ok(())
    }

    /// After every scene object has started.
    fn on_scene_start(&mut self, _core: &mut SceneCore) -> Result<(), BehaviourError> {
        Ok(())
    }

    fn on_before_frame_render(&mut self, _core: &mut SceneCore) -> Result<(), BehaviourError> {
        Ok(())
    }

    /// After scene objects update, before the driver draws.
    fn on_render(&mut self, _core: &mut SceneCore) -> Result<(), BehaviourError> {
        Ok(())
    }

    /// After the driver's draw call, or in its place when the driver does not
    /// draw; `renderer` is the session's backend.
    fn on_after_render(
        &mut self,
        _core: &mut SceneCore,
        _renderer: &mut dyn Draw,
    ) -> Result<(), BehaviourError> {
        Ok(())
    }
}

/// Hooks for scenes that need none.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHooks;

impl SceneHooks for NoHooks {}

/// The parts of a scene its hooks may touch.
#[derive(Debug)]
pub struct SceneCore {
    handle: Rc<SceneHandle>,
    instances: Vec<SceneObject>,
    default_camera: String,
    target: RenderTarget,
}

impl SceneCore {
    pub fn handle(&self) -> &Rc<SceneHandle> {
        &self.handle
    }

    pub fn instances(&self) -> &[SceneObject] {
        &self.instances
    }

    pub fn instance(&self, name: &str) -> Option<&SceneObject> {
        self.instances.iter().find(|o| o.name() == name)
    }

    pub fn instance_mut(&mut self, name: &str) -> Option<&mut SceneObject> {
        self.instances.iter_mut().find(|o| o.name() == name)
    }

    pub fn default_camera(&self) -> &str {
        &self.default_camera
    }

    pub fn current_camera_key(&self) -> Option<String> {
        self.handle.current_camera_key()
    }

    /// Make the camera declared under `key` the active one.
    pub fn use_camera(&mut self, key: &str) -> Result<(), BehaviourError> {
        if !self.handle.cameras().contains(key) {
            return Err(BehaviourError::UnknownCamera(key.to_string()));
        }
        self.handle.select_camera(Some(key.to_string()));
        Ok(())
    }

    pub fn target(&self) -> RenderTarget {
        self.target
    }

    /// Draw the scene graph through the active camera. Returns false, without
    /// drawing, when no camera is active.
    pub fn draw(&self, renderer: &mut dyn Draw) -> Result<bool, BehaviourError> {
        let Some(camera) = self.handle.camera() else {
            return Ok(false);
        };
        renderer.draw(&self.handle.graph(), &camera)?;
        Ok(true)
    }
}

/// Root behaviour: owns the scene graph, the cameras and the top-level
/// scene objects of one render session.
pub struct InteractiveScene {
    name: String,
    declared: Vec<SceneObjectDef>,
    core: SceneCore,
    hooks: Box<dyn SceneHooks>,
}

impl std::fmt::Debug for InteractiveScene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractiveScene")
            .field("name", &self.name)
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl InteractiveScene {
    /// Build the scene and run its `modify_scene` hook. Nothing is started.
    pub fn new(
        def: SceneDef,
        mut hooks: Box<dyn SceneHooks>,
        target: RenderTarget,
    ) -> Result<Self, BehaviourError> {
        let mut cameras = CameraRegistry::new();
        for (name, camera) in def.cameras {
            cameras.insert(&name, camera);
        }
        let handle = Rc::new(SceneHandle::new(cameras, target.size));
        hooks.modify_scene(&mut handle.graph_mut())?;

        Ok(Self {
            name: def.name,
            declared: def.objects,
            core: SceneCore {
                handle,
                instances: Vec::new(),
                default_camera: def.default_camera,
                target,
            },
            hooks,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handle(&self) -> &Rc<SceneHandle> {
        &self.core.handle
    }

    pub fn core(&self) -> &SceneCore {
        &self.core
    }

    pub fn declared_objects(&self) -> Vec<&str> {
        self.declared.iter().map(SceneObjectDef::name).collect()
    }

    pub fn instance(&self, name: &str) -> Option<&SceneObject> {
        self.core.instance(name)
    }

    pub fn current_camera(&self) -> Option<PerspectiveCamera> {
        self.core.handle.camera()
    }

    pub fn use_camera(&mut self, key: &str) -> Result<(), BehaviourError> {
        self.core.use_camera(key)
    }

    pub fn on_after_render(&mut self, renderer: &mut dyn Draw) -> Result<(), BehaviourError> {
        self.hooks.on_after_render(&mut self.core, renderer)
    }

    /// Track a new surface size: pointer normalization and every camera's aspect.
    pub fn resize(&mut self, size: Size) {
        self.core.target.size = size;
        self.core.handle.set_viewport(size);
        self.core.handle.cameras_mut().set_aspect(size.aspect());
    }

    pub fn dispatch_input(&self, event: &InputEvent) {
        self.core.handle.dispatch_input(event);
    }

    fn drop_instances(&mut self) -> Result<(), BehaviourError> {
        let mut graph = self.core.handle.graph_mut();
        for old in std::mem::take(&mut self.core.instances) {
            if let Some(group) = old.export_object_group().filter(|g| graph.contains(*g)) {
                graph.remove(group)?;
            }
        }
        Ok(())
    }
}

impl Behaviour for InteractiveScene {
    fn kind(&self) -> BehaviourKind {
        BehaviourKind::Root
    }

    fn start(&mut self) -> Result<(), BehaviourError> {
        let _span = tracing::info_span!("scene_start", scene = %self.name).entered();
        let handle = self.core.handle.clone();

        let resolved = handle
            .cameras()
            .contains(&self.core.default_camera)
            .then(|| self.core.default_camera.clone());
        if resolved.is_none() {
            tracing::warn!(camera = %self.core.default_camera, "default camera is not declared");
        }
        handle.select_camera(resolved);

        self.hooks.on_scene_awake(&mut self.core)?;

        self.drop_instances()?;
        let root = handle.graph().root();
        for def in &self.declared {
            let name = def.name().to_string();
            let wrap = |source| BehaviourError::SceneObject {
                name: name.clone(),
                source: Box::new(source),
            };

            self.core.instances.push(SceneObject::new(def.clone(), &handle));
            let index = self.core.instances.len() - 1;
            let object = &mut self.core.instances[index];
            object.start().map_err(wrap)?;
            if let Some(group) = object.export_object_group() {
                handle
                    .graph_mut()
                    .attach(root, group)
                    .map_err(|e| wrap(e.into()))?;
            }
        }

        self.hooks.on_scene_start(&mut self.core)?;
        tracing::info!(
            objects = self.core.instances.len(),
            nodes = handle.graph().len(),
            "scene started"
        );
        Ok(())
    }

    fn update(&mut self, time: f64) -> Result<(), BehaviourError> {
        self.hooks.on_before_frame_render(&mut self.core)?;
        for object in &mut self.core.instances {
            if let Err(source) = object.update(time) {
                return Err(BehaviourError::SceneObject {
                    name: object.name().to_string(),
                    source: Box::new(source),
                });
            }
        }
        self.hooks.on_render(&mut self.core)
    }

    fn export_object_group(&self) -> Option<NodeId> {
        Some(self.core.handle.graph().root())
    }
}
