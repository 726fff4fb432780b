//! Node hierarchy traversal: places converted mesh nodes as instances.

use std::sync::Arc;

use cgmath::{Matrix4, SquareMatrix};
use log::warn;

use super::TransformMode;
use crate::math::{to_f64_matrix, transform_or_identity};
use crate::mst::{InstanceMesh, MeshNode};
use crate::scene::{NodeId, Scene};

/// Walk the node tree depth-first in pre-order, emitting one instance per
/// valid mesh reference.
///
/// Mesh indices past the end of `nodes` are skipped with a warning; the walk
/// still visits that node's children. A node reachable twice (a malformed
/// arena with shared or cyclic children) is visited only the first time.
pub fn collect_instances(
    scene: &Scene,
    nodes: &[Arc<MeshNode>],
    mode: TransformMode,
) -> Vec<InstanceMesh> {
    let mut instances = Vec::new();
    let Some(root) = scene.root else {
        return instances;
    };

    let mut visited = vec![false; scene.nodes.len()];
    let mut stack: Vec<(NodeId, Matrix4<f32>)> = vec![(root, Matrix4::identity())];

    while let Some((id, parent_world)) = stack.pop() {
        let Some(node) = scene.node(id) else {
            warn!("node reference {} is outside the node list, skipping", id.0);
            continue;
        };
        if std::mem::replace(&mut visited[id.0], true) {
            warn!("node '{}' reached more than once, skipping", node.name);
            continue;
        }

        let local = transform_or_identity(node.transform.as_ref());
        let world = match mode {
            TransformMode::World => parent_world * local,
            TransformMode::Local => local,
        };

        for &mesh_index in &node.mesh_indices {
            let Some(mesh) = nodes.get(mesh_index) else {
                warn!(
                    "node '{}' references mesh {} but only {} exist",
                    node.name,
                    mesh_index,
                    nodes.len()
                );
                continue;
            };
            instances.push(InstanceMesh {
                transforms: vec![to_f64_matrix(&world)],
                mesh: Arc::clone(mesh),
            });
        }

        // reversed so the first child is popped first
        for &child in node.children.iter().rev() {
            stack.push((child, world));
        }
    }

    instances
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Node;
    use cgmath::Vector3;

    fn translate(x: f32) -> Matrix4<f32> {
        Matrix4::from_translation(Vector3::new(x, 0.0, 0.0))
    }

    fn shared_nodes(n: usize) -> Vec<Arc<MeshNode>> {
        (0..n).map(|_| Arc::new(MeshNode::default())).collect()
    }

    #[test]
    fn empty_scene_has_no_instances() {
        assert!(collect_instances(&Scene::new(), &[], TransformMode::World).is_empty());
    }

    #[test]
    fn visits_in_pre_order() {
        let mut scene = Scene::new();
        let root = scene.set_root(Node::new("root").with_meshes([0]));
        let a = scene.add_child(root, Node::new("a").with_meshes([1])).unwrap();
        scene.add_child(a, Node::new("a1").with_meshes([2])).unwrap();
        scene.add_child(root, Node::new("b").with_meshes([3])).unwrap();

        let nodes = shared_nodes(4);
        let instances = collect_instances(&scene, &nodes, TransformMode::Local);
        let order: Vec<usize> = instances
            .iter()
            .map(|i| nodes.iter().position(|n| Arc::ptr_eq(n, &i.mesh)).unwrap())
            .collect();
        assert_eq!(order, vec![0, 1, 2, 3]);
    }

    #[test]
    fn world_mode_accumulates_three_levels() {
        let mut scene = Scene::new();
        let root = scene.set_root(Node::new("root").with_transform(translate(1.0)).with_meshes([0]));
        let mid = scene
            .add_child(root, Node::new("mid").with_transform(translate(2.0)).with_meshes([0]))
            .unwrap();
        scene
            .add_child(mid, Node::new("leaf").with_transform(translate(4.0)).with_meshes([0]))
            .unwrap();

        let nodes = shared_nodes(1);
        let world = collect_instances(&scene, &nodes, TransformMode::World);
        let xs: Vec<f64> = world.iter().map(|i| i.transforms[0].w.x).collect();
        assert_eq!(xs, vec![1.0, 3.0, 7.0]);

        let local = collect_instances(&scene, &nodes, TransformMode::Local);
        let xs: Vec<f64> = local.iter().map(|i| i.transforms[0].w.x).collect();
        assert_eq!(xs, vec![1.0, 2.0, 4.0]);
    }

    #[test]
    fn cyclic_children_terminate() {
        let mut scene = Scene::new();
        let root = scene.set_root(Node::new("root").with_meshes([0]));
        let child = scene.add_child(root, Node::new("child").with_meshes([0])).unwrap();
        scene.nodes[child.0].children.push(root);
        scene.nodes[child.0].children.push(NodeId(99));

        let instances = collect_instances(&scene, &shared_nodes(1), TransformMode::World);
        assert_eq!(instances.len(), 2);
    }
}
