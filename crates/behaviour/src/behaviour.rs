use lumen_common::NodeId;
use lumen_graph::GraphError;
use lumen_render::RenderError;

/// Where a behaviour sits in the composition tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BehaviourKind {
    /// A single piece of per-object logic (a component).
    Leaf,
    /// Owns an ordered set of leaves and exports their nodes as one group.
    Composite,
    /// Owns the scene graph and the top-level composites.
    Root,
}

#[derive(Debug, thiserror::Error)]
pub enum BehaviourError {
    #[error("component `{key}` failed")]
    Component {
        key: String,
        #[source]
        source: Box<BehaviourError>,
    },
    #[error("scene object `{name}` failed")]
    SceneObject {
        name: String,
        #[source]
        source: Box<BehaviourError>,
    },
    #[error("required component `{0}` is not available")]
    MissingComponent(String),
    #[error("unknown camera: {0}")]
    UnknownCamera(String),
    #[error("the owning scene was dropped")]
    SceneGone,
    #[error("the owning scene object was dropped")]
    ParentGone,
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("{0}")]
    Custom(String),
}

impl BehaviourError {
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }

    /// The innermost error, unwrapping component and scene object context.
    pub fn root_cause(&self) -> &BehaviourError {
        match self {
            Self::Component { source, .. } | Self::SceneObject { source, .. } => {
                source.root_cause()
            }
            other => other,
        }
    }
}

/// The shared lifecycle contract of every behaviour.
///
/// `start` runs once before the first `update`. `update` receives a
/// non-decreasing timestamp in seconds since the render loop began and must
/// not repeat setup work. Every operation defaults to a no-op.
pub trait Behaviour {
    fn kind(&self) -> BehaviourKind {
        BehaviourKind::Leaf
    }

    fn start(&mut self) -> Result<(), BehaviourError> {
        Ok(())
    }

    fn update(&mut self, _time: f64) -> Result<(), BehaviourError> {
        Ok(())
    }

    /// The node this behaviour contributes to its owner's group, if any.
    fn export_as_scene_object(&self) -> Option<NodeId> {
        None
    }

    /// The group node aggregating a composite's children.
    fn export_object_group(&self) -> Option<NodeId> {
        None
    }
}
