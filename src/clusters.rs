// SPDX-FileCopyrightText: 2022 Thomas Kramer
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Hierarchical connected clusters of polygons.
//!
//! Clusters are formed per cell: shapes on connected layers (see
//! [`Connectivity`](crate::connectivity::Connectivity)) that touch each other
//! belong to the same cluster. Across hierarchy levels a parent cell cluster can
//! swallow clusters of child instances it interacts with; such child clusters
//! lose their *root* property. Root clusters are the units on which device
//! recognition operates.

use fnv::FnvHashMap;

use crate::connectivity::Connectivity;
use crate::layout::algorithms::polygons_interact;
use crate::layout::geometry::rects_interact;
use crate::layout::prelude::{
    CellIndex, CplxTrans, LayerIndex, Layout, Polygon, TryBoundingBox,
};

use std::collections::BTreeSet;
use std::rc::Rc;

/// Identifier of a cluster inside one cell (dense, starting at 0).
pub type ClusterId = usize;

/// One polygon participating in a cluster, together with its layer.
#[derive(Clone, Debug)]
pub struct ClusterShape {
    /// Layer the polygon lives on.
    pub layer: LayerIndex,
    /// The polygon body.
    pub polygon: Rc<Polygon>,
}

/// Downward connection of a parent cluster to a cluster of an instantiated cell.
#[derive(Clone, Debug)]
pub struct ClusterInstance {
    /// The instantiated (child) cell.
    pub cell: CellIndex,
    /// The cluster inside the child cell.
    pub cluster: ClusterId,
    /// Transformation of the instance.
    pub trans: CplxTrans,
}

#[derive(Clone, Debug, Default)]
struct Cluster {
    shapes: Vec<ClusterShape>,
    connections: Vec<ClusterInstance>,
}

/// The connected clusters of one cell.
#[derive(Clone, Debug, Default)]
pub struct ConnectedClusters {
    clusters: Vec<Cluster>,
    root: Vec<bool>,
}

impl ConnectedClusters {
    /// Number of clusters in this cell.
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    /// Tell if the cell has no clusters.
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Iterate over all cluster ids.
    pub fn each_cluster(&self) -> impl Iterator<Item = ClusterId> {
        0..self.clusters.len()
    }

    /// Tell whether the cluster has no upward connection to a parent cell.
    /// Only root clusters are "whole"; the others are parts of parent clusters.
    pub fn is_root(&self, cluster: ClusterId) -> bool {
        self.root.get(cluster).copied().unwrap_or(false)
    }

    /// The shapes the cluster holds in the cell itself.
    pub fn shapes(&self, cluster: ClusterId) -> &[ClusterShape] {
        &self.clusters[cluster].shapes
    }

    /// The downward connections of the cluster.
    pub fn connections(&self, cluster: ClusterId) -> &[ClusterInstance] {
        &self.clusters[cluster].connections
    }
}

/// Connected clusters for every cell reachable from a top cell.
pub struct HierClusters {
    per_cell: FnvHashMap<CellIndex, ConnectedClusters>,
}

// Union-find over cluster build nodes.
struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        UnionFind {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, i: usize) -> usize {
        if self.parent[i] != i {
            let root = self.find(self.parent[i]);
            self.parent[i] = root;
        }
        self.parent[i]
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            // Smaller root wins, keeping cluster numbering deterministic.
            let (lo, hi) = (ra.min(rb), ra.max(rb));
            self.parent[hi] = lo;
        }
    }
}

// A node of the per-cell cluster graph: either a local shape or a cluster of a
// child instance (with its flattened shapes transformed into parent coordinates).
enum BuildNode {
    Shape(ClusterShape),
    Child {
        instance: ClusterInstance,
        flat: Vec<ClusterShape>,
    },
}

impl HierClusters {
    /// Build the clusters of all cells reachable from `top_cell`.
    ///
    /// Shapes on the layers of `conn` are collected per cell (boxes and polygon
    /// references; other shape kinds do not participate), clustered by geometric
    /// contact, and connected across hierarchy levels.
    pub fn build(layout: &Layout, top_cell: CellIndex, conn: &Connectivity) -> Self {
        let reachable = layout.collect_called_cells(top_cell);
        let layers = conn.each_layer();

        let mut per_cell: FnvHashMap<CellIndex, ConnectedClusters> = Default::default();
        // Flattened shapes per (cell, cluster), in cell coordinates.
        let mut flat_cache: FnvHashMap<(CellIndex, ClusterId), Vec<ClusterShape>> =
            Default::default();

        // Children before parents.
        let order: Vec<_> = layout
            .each_cell_top_down()
            .into_iter()
            .filter(|c| reachable.contains(c))
            .rev()
            .collect();

        for cell_index in order {
            let cell = match layout.cell_by_index(cell_index) {
                Some(c) => c,
                None => continue,
            };

            // Collect the build nodes: local shapes first, then child clusters.
            let mut nodes: Vec<BuildNode> = Vec::new();
            for &layer in &layers {
                if let Some(shapes) = cell.shapes(layer) {
                    shapes.for_each_shape(|s| {
                        if let Some(p) = s.geometry.to_polygon() {
                            nodes.push(BuildNode::Shape(ClusterShape {
                                layer,
                                polygon: Rc::new(p),
                            }));
                        }
                    });
                }
            }
            for inst in cell.each_inst() {
                let child_clusters = match per_cell.get(&inst.cell()) {
                    Some(cc) => cc,
                    None => continue,
                };
                let t = inst.get_transform();
                for cluster in child_clusters.each_cluster() {
                    let flat = flat_cache
                        .get(&(inst.cell(), cluster))
                        .map(|shapes| {
                            shapes
                                .iter()
                                .map(|cs| ClusterShape {
                                    layer: cs.layer,
                                    polygon: Rc::new(cs.polygon.transformed(&t)),
                                })
                                .collect::<Vec<_>>()
                        })
                        .unwrap_or_default();
                    nodes.push(BuildNode::Child {
                        instance: ClusterInstance {
                            cell: inst.cell(),
                            cluster,
                            trans: t,
                        },
                        flat,
                    });
                }
            }

            // Union nodes that interact.
            let mut uf = UnionFind::new(nodes.len());
            for i in 0..nodes.len() {
                for j in (i + 1)..nodes.len() {
                    if nodes_interact(&nodes[i], &nodes[j], conn) {
                        uf.union(i, j);
                    }
                }
            }

            // Groups in deterministic order of their smallest node.
            let mut group_of_root: FnvHashMap<usize, usize> = Default::default();
            let mut groups: Vec<Vec<usize>> = Vec::new();
            for i in 0..nodes.len() {
                let root = uf.find(i);
                let g = *group_of_root.entry(root).or_insert_with(|| {
                    groups.push(Vec::new());
                    groups.len() - 1
                });
                groups[g].push(i);
            }

            let mut clusters = Vec::new();
            for group in &groups {
                let has_local = group
                    .iter()
                    .any(|&i| matches!(nodes[i], BuildNode::Shape(_)));
                // A lone child cluster stays where it is; it becomes a parent
                // cluster only when it connects to something at this level.
                if !has_local && group.len() < 2 {
                    continue;
                }
                let mut cluster = Cluster::default();
                for &i in group {
                    match &nodes[i] {
                        BuildNode::Shape(s) => cluster.shapes.push(s.clone()),
                        BuildNode::Child { instance, .. } => {
                            cluster.connections.push(instance.clone())
                        }
                    }
                }
                clusters.push(cluster);
            }

            // Fill the flat cache for this cell.
            for (id, cluster) in clusters.iter().enumerate() {
                let mut flat: Vec<ClusterShape> = cluster.shapes.clone();
                for conn_inst in &cluster.connections {
                    if let Some(child_flat) = flat_cache.get(&(conn_inst.cell, conn_inst.cluster)) {
                        flat.extend(child_flat.iter().map(|cs| ClusterShape {
                            layer: cs.layer,
                            polygon: Rc::new(cs.polygon.transformed(&conn_inst.trans)),
                        }));
                    }
                }
                flat_cache.insert((cell_index, id), flat);
            }

            let root = vec![true; clusters.len()];
            per_cell.insert(cell_index, ConnectedClusters { clusters, root });
        }

        // Clusters referenced from a parent cell are not root.
        let mut non_root: BTreeSet<(CellIndex, ClusterId)> = BTreeSet::new();
        for cc in per_cell.values() {
            for cluster in cc.each_cluster() {
                for conn_inst in cc.connections(cluster) {
                    non_root.insert((conn_inst.cell, conn_inst.cluster));
                }
            }
        }
        for (cell, cluster) in non_root {
            if let Some(cc) = per_cell.get_mut(&cell) {
                if let Some(flag) = cc.root.get_mut(cluster) {
                    *flag = false;
                }
            }
        }

        HierClusters { per_cell }
    }

    /// The clusters of one cell. Cells without shapes on the cluster layers have
    /// an empty cluster set.
    pub fn clusters_per_cell(&self, cell: CellIndex) -> ConnectedClusters {
        self.per_cell.get(&cell).cloned().unwrap_or_default()
    }

    /// Visit every shape of a cluster on the given layer, recursively descending
    /// into connected child clusters. The callback receives the polygon and the
    /// accumulated transformation into the coordinates of the starting cell.
    pub fn for_each_cluster_shape<F>(
        &self,
        cell: CellIndex,
        cluster: ClusterId,
        layer: LayerIndex,
        f: &mut F,
    ) where
        F: FnMut(&Rc<Polygon>, &CplxTrans),
    {
        self.for_each_cluster_shape_recursive(cell, cluster, layer, &CplxTrans::identity(), f)
    }

    fn for_each_cluster_shape_recursive<F>(
        &self,
        cell: CellIndex,
        cluster: ClusterId,
        layer: LayerIndex,
        trans: &CplxTrans,
        f: &mut F,
    ) where
        F: FnMut(&Rc<Polygon>, &CplxTrans),
    {
        let cc = match self.per_cell.get(&cell) {
            Some(cc) => cc,
            None => return,
        };
        if cluster >= cc.len() {
            return;
        }
        for shape in cc.shapes(cluster) {
            if shape.layer == layer {
                f(&shape.polygon, trans);
            }
        }
        for conn_inst in cc.connections(cluster) {
            let t = trans.concat(&conn_inst.trans);
            self.for_each_cluster_shape_recursive(conn_inst.cell, conn_inst.cluster, layer, &t, f);
        }
    }
}

fn nodes_interact(a: &BuildNode, b: &BuildNode, conn: &Connectivity) -> bool {
    let shapes_a: &[ClusterShape] = match a {
        BuildNode::Shape(s) => std::slice::from_ref(s),
        BuildNode::Child { flat, .. } => flat,
    };
    let shapes_b: &[ClusterShape] = match b {
        BuildNode::Shape(s) => std::slice::from_ref(s),
        BuildNode::Child { flat, .. } => flat,
    };
    for sa in shapes_a {
        let bbox_a = sa.polygon.try_bounding_box();
        for sb in shapes_b {
            if !conn.connects(sa.layer, sb.layer) {
                continue;
            }
            if let (Some(ba), Some(bb)) = (bbox_a, sb.polygon.try_bounding_box()) {
                if !rects_interact(&ba, &bb, true) {
                    continue;
                }
            }
            if polygons_interact(&sa.polygon, &sb.polygon, true) {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use iron_shapes::point::Point;
    use iron_shapes::rect::Rect;
    use iron_shapes::vector::Vector;

    #[test]
    fn test_two_disjoint_shapes_make_two_clusters() {
        let layout = Layout::new();
        let top = layout.create_cell(Some("TOP".into()));
        let layer = layout.insert_layer();
        let shapes = layout.cell_by_index(top).unwrap().shapes_get_or_create(layer);
        shapes.insert(Rect::new(Point::new(0, 0), Point::new(10, 10)));
        shapes.insert(Rect::new(Point::new(100, 100), Point::new(110, 110)));

        let mut conn = Connectivity::new();
        conn.connect(layer);

        let clusters = HierClusters::build(&layout, top, &conn);
        let cc = clusters.clusters_per_cell(top);
        assert_eq!(cc.len(), 2);
        assert!(cc.is_root(0) && cc.is_root(1));
    }

    #[test]
    fn test_touching_shapes_merge() {
        let layout = Layout::new();
        let top = layout.create_cell(Some("TOP".into()));
        let layer = layout.insert_layer();
        let shapes = layout.cell_by_index(top).unwrap().shapes_get_or_create(layer);
        shapes.insert(Rect::new(Point::new(0, 0), Point::new(10, 10)));
        shapes.insert(Rect::new(Point::new(10, 0), Point::new(20, 10)));

        let mut conn = Connectivity::new();
        conn.connect(layer);

        let clusters = HierClusters::build(&layout, top, &conn);
        assert_eq!(clusters.clusters_per_cell(top).len(), 1);
    }

    #[test]
    fn test_parent_swallows_child_cluster() {
        let layout = Layout::new();
        let top = layout.create_cell(Some("TOP".into()));
        let sub = layout.create_cell(Some("SUB".into()));
        let layer = layout.insert_layer();

        layout
            .cell_by_index(sub)
            .unwrap()
            .shapes_get_or_create(layer)
            .insert(Rect::new(Point::new(0, 0), Point::new(10, 10)));
        // The instance places the child shape at (50, 0); the parent shape touches it.
        layout
            .cell_by_index(top)
            .unwrap()
            .shapes_get_or_create(layer)
            .insert(Rect::new(Point::new(30, 0), Point::new(50, 10)));
        layout.insert_cell_instance(top, sub, CplxTrans::translation(Vector::new(50, 0)));

        let mut conn = Connectivity::new();
        conn.connect(layer);

        let clusters = HierClusters::build(&layout, top, &conn);

        let top_clusters = clusters.clusters_per_cell(top);
        assert_eq!(top_clusters.len(), 1);
        assert!(top_clusters.is_root(0));
        assert_eq!(top_clusters.connections(0).len(), 1);

        // The child cluster lost its root property.
        let sub_clusters = clusters.clusters_per_cell(sub);
        assert_eq!(sub_clusters.len(), 1);
        assert!(!sub_clusters.is_root(0));

        // Recursive iteration accumulates the instance transformation.
        let mut collected = Vec::new();
        clusters.for_each_cluster_shape(top, 0, layer, &mut |p, t| {
            collected.push(p.transformed(t));
        });
        assert_eq!(collected.len(), 2);
        let bbox = collected
            .iter()
            .filter_map(|p| p.try_bounding_box())
            .reduce(|a, b| crate::layout::geometry::rect_union(&a, &b))
            .unwrap();
        assert_eq!(bbox, Rect::new(Point::new(30, 0), Point::new(60, 10)));
    }

    #[test]
    fn test_unconnected_child_cluster_stays_root_in_child() {
        let layout = Layout::new();
        let top = layout.create_cell(Some("TOP".into()));
        let sub = layout.create_cell(Some("SUB".into()));
        let layer = layout.insert_layer();

        layout
            .cell_by_index(sub)
            .unwrap()
            .shapes_get_or_create(layer)
            .insert(Rect::new(Point::new(0, 0), Point::new(10, 10)));
        layout.insert_cell_instance(top, sub, CplxTrans::translation(Vector::new(500, 0)));

        let mut conn = Connectivity::new();
        conn.connect(layer);

        let clusters = HierClusters::build(&layout, top, &conn);
        assert_eq!(clusters.clusters_per_cell(top).len(), 0);
        let sub_clusters = clusters.clusters_per_cell(sub);
        assert_eq!(sub_clusters.len(), 1);
        assert!(sub_clusters.is_root(0));
    }
}
