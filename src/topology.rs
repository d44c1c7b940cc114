//! Static topology table for the Erde-Mars mesh.
//!
//! The table holds nodes, undirected links, and named routes. It is
//! validated once in [`Topology::new`]: every route must be a contiguous
//! walk over existing links from one endpoint to the other, all routes must
//! join the same endpoint pair, and at least two routes must use different
//! relays. After construction the table is read-only.

use crate::error::{RouteError, TopologyError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Earth endpoint.
pub const ERDE: &str = "Erde";
/// Mars endpoint.
pub const MARS: &str = "Mars";

/// Node category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Route terminus.
    Endpoint,
    /// Intermediate swap station.
    Relay,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Endpoint => "endpoint",
            NodeKind::Relay => "relay",
        }
    }
}

/// A mesh node. Coordinates are carried for rendering only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub kind: NodeKind,
    pub label: String,
}

impl Node {
    pub fn endpoint(id: &str, x: f64, y: f64, label: &str) -> Self {
        Self {
            id: id.to_string(),
            x,
            y,
            kind: NodeKind::Endpoint,
            label: label.to_string(),
        }
    }

    pub fn relay(id: &str, x: f64, y: f64, label: &str) -> Self {
        Self {
            id: id.to_string(),
            x,
            y,
            kind: NodeKind::Relay,
            label: label.to_string(),
        }
    }
}

/// Unordered pair of node ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    pub a: String,
    pub b: String,
}

impl Link {
    pub fn new(a: &str, b: &str) -> Self {
        Self {
            a: a.to_string(),
            b: b.to_string(),
        }
    }

    /// Whether this link joins `x` and `y` in either direction.
    pub fn joins(&self, x: &str, y: &str) -> bool {
        (self.a == x && self.b == y) || (self.a == y && self.b == x)
    }

    fn key(&self) -> (String, String) {
        if self.a <= self.b {
            (self.a.clone(), self.b.clone())
        } else {
            (self.b.clone(), self.a.clone())
        }
    }
}

/// A resolved route: node ids in traversal order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub key: String,
    pub nodes: Vec<String>,
}

impl Route {
    /// Number of nodes on the route, endpoints included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of intermediate relay traversals.
    pub fn hops(&self) -> usize {
        self.nodes.len().saturating_sub(2)
    }

    /// Interior relay ids.
    pub fn relays(&self) -> &[String] {
        if self.nodes.len() <= 2 {
            &[]
        } else {
            &self.nodes[1..self.nodes.len() - 1]
        }
    }

    /// True iff `a` and `b` sit next to each other on this route.
    pub fn is_edge_active(&self, a: &str, b: &str) -> bool {
        let pos_a = self.nodes.iter().position(|n| n == a);
        let pos_b = self.nodes.iter().position(|n| n == b);
        match (pos_a, pos_b) {
            (Some(i), Some(j)) => i.abs_diff(j) == 1,
            _ => false,
        }
    }

    /// Human-readable path, e.g. `Mars → Repeater3 → Erde`.
    pub fn describe(&self) -> String {
        self.nodes.join(" → ")
    }
}

/// Validated, read-only topology table.
#[derive(Debug, Clone)]
pub struct Topology {
    nodes: Vec<Node>,
    links: Vec<Link>,
    routes: BTreeMap<String, Vec<String>>,
    link_index: HashSet<(String, String)>,
}

impl Topology {
    /// Build and validate a topology table.
    pub fn new(
        nodes: Vec<Node>,
        links: Vec<Link>,
        routes: Vec<(String, Vec<String>)>,
    ) -> Result<Self, TopologyError> {
        let mut by_id: HashMap<&str, &Node> = HashMap::new();
        for node in &nodes {
            if by_id.insert(node.id.as_str(), node).is_some() {
                return Err(TopologyError::DuplicateNode(node.id.clone()));
            }
        }

        let mut link_index = HashSet::new();
        for link in &links {
            for end in [&link.a, &link.b] {
                if !by_id.contains_key(end.as_str()) {
                    return Err(TopologyError::UnknownNode {
                        node: end.clone(),
                        context: format!("link {}-{}", link.a, link.b),
                    });
                }
            }
            link_index.insert(link.key());
        }

        let mut endpoint_pair: Option<(String, String)> = None;
        let mut relay_sets: BTreeSet<Vec<String>> = BTreeSet::new();
        let mut route_map = BTreeMap::new();

        for (key, path) in routes {
            if path.len() < 2 {
                return Err(TopologyError::RouteTooShort {
                    key,
                    len: path.len(),
                });
            }

            for id in &path {
                if !by_id.contains_key(id.as_str()) {
                    return Err(TopologyError::UnknownNode {
                        node: id.clone(),
                        context: format!("route {}", key),
                    });
                }
            }

            for pair in path.windows(2) {
                if !link_index.contains(&Link::new(&pair[0], &pair[1]).key()) {
                    return Err(TopologyError::MissingLink {
                        key,
                        from: pair[0].clone(),
                        to: pair[1].clone(),
                    });
                }
            }

            let first = &path[0];
            let last = &path[path.len() - 1];
            let is_endpoint = |id: &String| {
                by_id
                    .get(id.as_str())
                    .map(|n| n.kind == NodeKind::Endpoint)
                    .unwrap_or(false)
            };
            if !is_endpoint(first) || !is_endpoint(last) || first == last {
                return Err(TopologyError::NotEndpointToEndpoint { key });
            }

            let pair = if first <= last {
                (first.clone(), last.clone())
            } else {
                (last.clone(), first.clone())
            };
            match &endpoint_pair {
                Some(expected) if *expected != pair => {
                    return Err(TopologyError::EndpointMismatch { key });
                }
                Some(_) => {}
                None => endpoint_pair = Some(pair),
            }

            let mut relays: Vec<String> = path[1..path.len() - 1].to_vec();
            relays.sort();
            relay_sets.insert(relays);

            route_map.insert(key, path);
        }

        if relay_sets.len() < 2 {
            return Err(TopologyError::NoAlternateRoute {
                found: relay_sets.len(),
            });
        }

        Ok(Self {
            nodes,
            links,
            routes: route_map,
            link_index,
        })
    }

    /// The Erde-Mars mesh: two relay chains plus a bridge relay that
    /// cross-connects them.
    pub fn earth_mars() -> Result<Self, TopologyError> {
        let nodes = vec![
            Node::endpoint(ERDE, 80.0, 250.0, "Erde"),
            Node::relay("Repeater1A", 220.0, 120.0, "R1-A"),
            Node::relay("Repeater1B", 380.0, 120.0, "R1-B"),
            Node::relay("Repeater2A", 220.0, 380.0, "R2-A"),
            Node::relay("Repeater2B", 380.0, 380.0, "R2-B"),
            Node::relay("Repeater3", 300.0, 250.0, "R3-Bridge"),
            Node::endpoint(MARS, 520.0, 250.0, "Mars"),
        ];

        let links = vec![
            // upper chain
            Link::new(ERDE, "Repeater1A"),
            Link::new("Repeater1A", "Repeater1B"),
            Link::new("Repeater1B", MARS),
            // lower chain
            Link::new(ERDE, "Repeater2A"),
            Link::new("Repeater2A", "Repeater2B"),
            Link::new("Repeater2B", MARS),
            // bridge
            Link::new(ERDE, "Repeater3"),
            Link::new("Repeater3", "Repeater1B"),
            Link::new("Repeater3", "Repeater2B"),
            Link::new("Repeater3", MARS),
        ];

        let path = |ids: &[&str]| ids.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        let routes = vec![
            (
                "primary".to_string(),
                path(&[MARS, "Repeater1B", "Repeater1A", ERDE]),
            ),
            (
                "backup".to_string(),
                path(&[MARS, "Repeater2B", "Repeater2A", ERDE]),
            ),
            ("bridge".to_string(), path(&[MARS, "Repeater3", ERDE])),
        ];

        Self::new(nodes, links, routes)
    }

    /// Resolve a route key to its node sequence.
    pub fn resolve_route(&self, key: &str) -> Result<Route, RouteError> {
        self.routes
            .get(key)
            .map(|nodes| Route {
                key: key.to_string(),
                nodes: nodes.clone(),
            })
            .ok_or_else(|| RouteError::UnknownRouteKey(key.to_string()))
    }

    /// Configured route keys in sorted order.
    pub fn route_keys(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(|k| k.as_str())
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Whether a link joins `a` and `b`.
    pub fn has_link(&self, a: &str, b: &str) -> bool {
        self.link_index.contains(&Link::new(a, b).key())
    }

    /// Links lying on the given route, for highlighting.
    pub fn active_links<'a>(&'a self, route: &'a Route) -> impl Iterator<Item = &'a Link> + 'a {
        self.links
            .iter()
            .filter(move |l| route.is_edge_active(&l.a, &l.b))
    }
}
