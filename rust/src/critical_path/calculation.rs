//! Critical path calculation using forward and backward passes.
//!
//! Summaries with children are roll-up nodes: their early span covers their
//! children, links placed on a summary apply to each of its work tasks, and a
//! child's late finish is bounded by its summary's late finish.

use rustc_hash::{FxHashMap, FxHashSet};
use std::cmp::Reverse;
use std::collections::VecDeque;

use crate::error::ScheduleError;
use crate::models::{LinkType, ScheduleTask, TaskKind};

use super::types::{CriticalPathResult, TaskTiming};

#[derive(Clone, Copy, Debug)]
struct Link {
    pred: usize,
    link_type: LinkType,
    lag: i64,
}

/// Task network indexed by position, with summary links expanded onto work
/// tasks. Building it rejects dependency cycles.
#[derive(Clone, Debug)]
pub struct Network {
    uids: Vec<u32>,
    position: FxHashMap<u32, usize>,
    kinds: Vec<TaskKind>,
    durations: Vec<i64>,
    parent: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
    /// Expanded predecessor links of each node.
    links: Vec<Vec<Link>>,
    /// Nodes linked from each node (one entry per link).
    successors: Vec<Vec<usize>>,
    /// Topological order: predecessors and children before their dependents.
    order: Vec<usize>,
}

impl Network {
    pub fn build(tasks: &[ScheduleTask]) -> Result<Self, ScheduleError> {
        let n = tasks.len();
        let mut position: FxHashMap<u32, usize> =
            FxHashMap::with_capacity_and_hasher(n, Default::default());
        for (i, task) in tasks.iter().enumerate() {
            if position.insert(task.uid, i).is_some() {
                return Err(ScheduleError::input(
                    format!("tasks[{}]", task.uid),
                    "duplicate task uid",
                ));
            }
        }

        let mut parent = vec![None; n];
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (i, task) in tasks.iter().enumerate() {
            let Some(parent_uid) = task.parent_uid else {
                continue;
            };
            if let Some(&p) = position.get(&parent_uid) {
                if p != i && tasks[p].is_summary() {
                    parent[i] = Some(p);
                    children[p].push(i);
                }
            }
        }

        let mut links: Vec<Vec<Link>> = vec![Vec::new(); n];
        for (i, task) in tasks.iter().enumerate() {
            let targets = if children[i].is_empty() {
                vec![i]
            } else {
                leaf_descendants(&children, i)
            };
            for pred in &task.predecessors {
                let Some(&p) = position.get(&pred.uid) else {
                    return Err(ScheduleError::input(
                        format!("tasks[{}].predecessors", task.uid),
                        format!("unknown predecessor uid {}", pred.uid),
                    ));
                };
                let link = Link {
                    pred: p,
                    link_type: pred.link_type,
                    lag: i64::from(pred.lag_days),
                };
                for &target in &targets {
                    links[target].push(link);
                }
            }
        }

        let mut successors: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (i, node_links) in links.iter().enumerate() {
            for link in node_links {
                successors[link.pred].push(i);
            }
        }

        let mut network = Self {
            uids: tasks.iter().map(|t| t.uid).collect(),
            position,
            kinds: tasks.iter().map(|t| t.kind).collect(),
            durations: tasks.iter().map(|t| i64::from(t.duration_days)).collect(),
            parent,
            children,
            links,
            successors,
            order: Vec::new(),
        };
        network.order = network.topological_order()?;
        Ok(network)
    }

    fn len(&self) -> usize {
        self.uids.len()
    }

    pub fn kind(&self, uid: u32) -> Option<TaskKind> {
        self.position.get(&uid).map(|&i| self.kinds[i])
    }

    /// Whether `uid` is a summary that rolls up children.
    pub fn is_rollup(&self, uid: u32) -> bool {
        self.position
            .get(&uid)
            .is_some_and(|&i| !self.children[i].is_empty())
    }

    pub fn children(&self, uid: u32) -> Vec<u32> {
        self.position
            .get(&uid)
            .map(|&i| self.children[i].iter().map(|&c| self.uids[c]).collect())
            .unwrap_or_default()
    }

    /// Predecessor uids after summary expansion, first occurrence order.
    pub fn predecessors(&self, uid: u32) -> Vec<u32> {
        let Some(&i) = self.position.get(&uid) else {
            return Vec::new();
        };
        let mut seen = FxHashSet::default();
        self.links[i]
            .iter()
            .map(|link| self.uids[link.pred])
            .filter(|p| seen.insert(*p))
            .collect()
    }

    /// Successor uids after summary expansion, first occurrence order.
    pub fn successors(&self, uid: u32) -> Vec<u32> {
        let Some(&i) = self.position.get(&uid) else {
            return Vec::new();
        };
        let mut seen = FxHashSet::default();
        self.successors[i]
            .iter()
            .map(|&s| self.uids[s])
            .filter(|s| seen.insert(*s))
            .collect()
    }

    fn is_rollup_at(&self, i: usize) -> bool {
        !self.children[i].is_empty()
    }

    fn downstream(&self, i: usize) -> impl Iterator<Item = usize> + '_ {
        self.successors[i].iter().copied().chain(self.parent[i])
    }

    /// Kahn's algorithm over links and child-to-summary roll-up edges.
    fn topological_order(&self) -> Result<Vec<usize>, ScheduleError> {
        let n = self.len();
        let mut in_degree: Vec<usize> = (0..n)
            .map(|i| self.links[i].len() + self.children[i].len())
            .collect();
        let mut queue: VecDeque<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
        let mut order = Vec::with_capacity(n);

        while let Some(i) = queue.pop_front() {
            order.push(i);
            for next in self.downstream(i) {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    queue.push_back(next);
                }
            }
        }

        if order.len() == n {
            return Ok(order);
        }

        // Drop nodes that merely hang off a cycle, keeping the cycle members
        let mut remaining = vec![true; n];
        for &i in &order {
            remaining[i] = false;
        }
        loop {
            let sinks: Vec<usize> = (0..n)
                .filter(|&i| remaining[i] && !self.downstream(i).any(|s| remaining[s]))
                .collect();
            if sinks.is_empty() {
                break;
            }
            for i in sinks {
                remaining[i] = false;
            }
        }
        let mut uids: Vec<u32> = (0..n)
            .filter(|&i| remaining[i])
            .map(|i| self.uids[i])
            .collect();
        uids.sort_unstable();
        Err(ScheduleError::CycleDetected { uids })
    }

    /// Forward and backward pass with the tasks' own durations.
    pub fn analyze(&self) -> CriticalPathResult {
        self.analyze_with(&FxHashMap::default())
    }

    /// Forward and backward pass with some work durations replaced.
    pub fn analyze_with(&self, durations: &FxHashMap<u32, u32>) -> CriticalPathResult {
        let n = self.len();
        let dur: Vec<i64> = (0..n)
            .map(|i| {
                durations
                    .get(&self.uids[i])
                    .map_or(self.durations[i], |&d| i64::from(d))
            })
            .collect();

        // Forward pass
        let mut es = vec![0i64; n];
        let mut ef = vec![0i64; n];
        let mut cum = vec![0i64; n];
        for &i in &self.order {
            if self.is_rollup_at(i) {
                let kids = &self.children[i];
                es[i] = kids.iter().map(|&c| es[c]).min().unwrap_or(0);
                ef[i] = kids.iter().map(|&c| ef[c]).max().unwrap_or(0);
                cum[i] = kids.iter().map(|&c| cum[c]).max().unwrap_or(0);
            } else {
                let mut start = 0;
                let mut longest = 0;
                for link in &self.links[i] {
                    let p = link.pred;
                    start = start.max(link.link_type.earliest_start(link.lag, es[p], ef[p], dur[i]));
                    longest = longest.max(cum[p]);
                }
                es[i] = start;
                ef[i] = start + dur[i];
                cum[i] = dur[i] + longest;
            }
        }
        let project_length = ef.iter().copied().max().unwrap_or(0);

        // Backward pass
        let mut lf = vec![project_length; n];
        for &j in self.order.iter().rev() {
            if self.is_rollup_at(j) {
                for &c in &self.children[j] {
                    lf[c] = lf[c].min(lf[j]);
                }
            } else {
                let ls_j = lf[j] - dur[j];
                for link in &self.links[j] {
                    let p = link.pred;
                    let bound = link.link_type.latest_finish(link.lag, ls_j, lf[j], ef[p] - es[p]);
                    lf[p] = lf[p].min(bound);
                }
            }
        }

        let mut ls = vec![0i64; n];
        for &i in &self.order {
            ls[i] = if self.is_rollup_at(i) {
                self.children[i].iter().map(|&c| ls[c]).min().unwrap_or(lf[i])
            } else {
                lf[i] - dur[i]
            };
        }

        let slack: Vec<i64> = (0..n)
            .map(|i| {
                if self.is_rollup_at(i) {
                    lf[i] - ef[i]
                } else {
                    ls[i] - es[i]
                }
            })
            .collect();

        let timings: FxHashMap<u32, TaskTiming> = (0..n)
            .map(|i| {
                (
                    self.uids[i],
                    TaskTiming {
                        earliest_start: es[i],
                        earliest_finish: ef[i],
                        latest_start: ls[i],
                        latest_finish: lf[i],
                        slack: slack[i],
                        cumulative_duration: cum[i],
                    },
                )
            })
            .collect();

        let mut critical: Vec<usize> = (0..n).filter(|&i| slack[i] <= 0).collect();
        critical.sort_by_key(|&i| (es[i], Reverse(cum[i]), self.uids[i]));
        let critical_path = critical.into_iter().map(|i| self.uids[i]).collect();

        let driving_chain = self.driving_chain(&es, &ef, &cum, &dur, &slack, project_length);

        CriticalPathResult {
            timings,
            critical_path,
            project_length,
            driving_chain,
        }
    }

    /// Walk back from the latest-finishing critical work task over binding
    /// critical predecessors.
    fn driving_chain(
        &self,
        es: &[i64],
        ef: &[i64],
        cum: &[i64],
        dur: &[i64],
        slack: &[i64],
        project_length: i64,
    ) -> Vec<u32> {
        let n = self.len();
        let is_work = |i: usize| !self.is_rollup_at(i) && self.kinds[i] != TaskKind::Summary;

        let Some(end) = (0..n)
            .filter(|&i| is_work(i) && slack[i] <= 0 && ef[i] == project_length)
            .max_by_key(|&i| {
                (
                    cum[i],
                    self.kinds[i] != TaskKind::Milestone,
                    Reverse(self.uids[i]),
                )
            })
        else {
            return Vec::new();
        };

        let mut chain = vec![end];
        let mut visited: FxHashSet<usize> = FxHashSet::default();
        visited.insert(end);
        let mut current = end;

        loop {
            let binding = self.links[current]
                .iter()
                .filter(|link| {
                    let p = link.pred;
                    slack[p] <= 0
                        && link.link_type.earliest_start(link.lag, es[p], ef[p], dur[current])
                            == es[current]
                })
                .map(|link| link.pred)
                .max_by_key(|&p| (cum[p], Reverse(self.uids[p])));
            let Some(pred) = binding else {
                break;
            };
            let Some(next) = self.enter_rollup(pred, ef, cum, slack) else {
                break;
            };
            if !visited.insert(next) {
                break;
            }
            chain.push(next);
            current = next;
        }

        chain.reverse();
        chain.into_iter().map(|i| self.uids[i]).collect()
    }

    /// Descend from a summary to the critical work task that sets its finish.
    fn enter_rollup(&self, node: usize, ef: &[i64], cum: &[i64], slack: &[i64]) -> Option<usize> {
        let mut current = node;
        let mut depth = 0;
        while self.is_rollup_at(current) {
            current = self.children[current]
                .iter()
                .copied()
                .filter(|&c| slack[c] <= 0 && ef[c] == ef[current])
                .max_by_key(|&c| (cum[c], Reverse(self.uids[c])))?;
            depth += 1;
            if depth > self.len() {
                return None;
            }
        }
        Some(current)
    }
}

/// Work tasks under summary `root`, descending through nested summaries.
fn leaf_descendants(children: &[Vec<usize>], root: usize) -> Vec<usize> {
    let mut leaves = Vec::new();
    let mut visited: FxHashSet<usize> = FxHashSet::default();
    let mut stack: Vec<usize> = children[root].iter().rev().copied().collect();
    while let Some(node) = stack.pop() {
        if node == root || !visited.insert(node) {
            continue;
        }
        if children[node].is_empty() {
            leaves.push(node);
        } else {
            stack.extend(children[node].iter().rev().copied());
        }
    }
    leaves
}

/// Analyze a schedule's tasks in one go.
pub fn calculate_critical_path(tasks: &[ScheduleTask]) -> Result<CriticalPathResult, ScheduleError> {
    Ok(Network::build(tasks)?.analyze())
}
