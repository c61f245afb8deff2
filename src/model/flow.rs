use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashSet;

use crate::error::{SurveyError, SurveyResult};
use crate::model::Block;

/// Handle to a block owned by a [`FlowTree`].
///
/// Two `BlockRef` nodes holding the same key present the same block, which is
/// created on the platform only once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockKey(usize);

impl BlockKey {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupFlow {
    pub description: String,
    children: Vec<FlowNode>,
}

/// Presents a random subset of its children to each participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockRandomizer {
    n_samples: usize,
    even_presentation: bool,
    children: Vec<FlowNode>,
}

impl BlockRandomizer {
    /// `n_samples` children are drawn per participant, so it must lie in
    /// `1..=children.len()`. With `even_presentation` the platform balances
    /// the draws across participants.
    pub fn new(
        n_samples: usize,
        even_presentation: bool,
        children: Vec<FlowNode>,
    ) -> SurveyResult<Self> {
        let randomizer = Self {
            n_samples,
            even_presentation,
            children,
        };
        randomizer.check()?;
        Ok(randomizer)
    }

    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    pub fn even_presentation(&self) -> bool {
        self.even_presentation
    }

    pub fn children(&self) -> &[FlowNode] {
        &self.children
    }

    fn check(&self) -> SurveyResult<()> {
        if self.n_samples == 0 || self.n_samples > self.children.len() {
            return Err(SurveyError::Configuration(format!(
                "block randomizer samples {} of {} children, expected between 1 and {}",
                self.n_samples,
                self.children.len(),
                self.children.len()
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FlowNode {
    Group(GroupFlow),
    BlockRandomizer(BlockRandomizer),
    BlockRef { block: BlockKey },
    EndSurvey,
}

impl FlowNode {
    pub fn group(description: impl Into<String>) -> Self {
        FlowNode::Group(GroupFlow {
            description: description.into(),
            children: Vec::new(),
        })
    }

    pub fn group_of(description: impl Into<String>, children: Vec<FlowNode>) -> Self {
        FlowNode::Group(GroupFlow {
            description: description.into(),
            children,
        })
    }

    pub fn block(key: BlockKey) -> Self {
        FlowNode::BlockRef { block: key }
    }

    pub fn children(&self) -> &[FlowNode] {
        match self {
            FlowNode::Group(group) => &group.children,
            FlowNode::BlockRandomizer(randomizer) => &randomizer.children,
            FlowNode::BlockRef { .. } | FlowNode::EndSurvey => &[],
        }
    }

    /// Append a child to a group or randomizer, returning the child.
    pub fn append(&mut self, child: FlowNode) -> SurveyResult<&mut FlowNode> {
        let children = match self {
            FlowNode::Group(group) => &mut group.children,
            // adding children only widens the sampling range
            FlowNode::BlockRandomizer(randomizer) => &mut randomizer.children,
            FlowNode::BlockRef { .. } => {
                return Err(SurveyError::Configuration(
                    "a block flow element has no children".to_string(),
                ))
            }
            FlowNode::EndSurvey => {
                return Err(SurveyError::Configuration(
                    "an end-of-survey flow element has no children".to_string(),
                ))
            }
        };
        children.push(child);
        let last = children.len() - 1;
        Ok(&mut children[last])
    }

    fn collect_block_keys(&self, seen: &mut HashSet<BlockKey>, out: &mut Vec<BlockKey>) {
        if let FlowNode::BlockRef { block } = self {
            if seen.insert(*block) {
                out.push(*block);
            }
        }
        for child in self.children() {
            child.collect_block_keys(seen, out);
        }
    }

    fn check(&self, block_count: usize) -> SurveyResult<()> {
        match self {
            FlowNode::BlockRandomizer(randomizer) => randomizer.check()?,
            FlowNode::BlockRef { block } if block.0 >= block_count => {
                return Err(SurveyError::Configuration(format!(
                    "flow references block #{} but the survey only owns {} blocks",
                    block.0, block_count
                )))
            }
            _ => {}
        }
        self.children()
            .iter()
            .try_for_each(|child| child.check(block_count))
    }

    /// Render this node with flow ID `FL_<flow_id>`; children take the
    /// following IDs in pre-order. Returns the payload and the last ID used.
    fn compile(&self, flow_id: usize, blocks: &[Block]) -> SurveyResult<(Value, usize)> {
        let mut data = Map::new();
        data.insert("FlowID".to_string(), json!(format!("FL_{}", flow_id)));

        match self {
            FlowNode::BlockRef { block } => {
                let id = resolve_block_id(*block, blocks)?;
                data.insert("Type".to_string(), json!("Block"));
                data.insert("ID".to_string(), json!(id));
                data.insert("Autofill".to_string(), json!([]));
                return Ok((Value::Object(data), flow_id));
            }
            FlowNode::Group(group) => {
                data.insert("Type".to_string(), json!("Group"));
                data.insert("Description".to_string(), json!(group.description));
            }
            FlowNode::BlockRandomizer(randomizer) => {
                data.insert("Type".to_string(), json!("BlockRandomizer"));
                data.insert("SubSet".to_string(), json!(randomizer.n_samples));
                data.insert(
                    "EvenPresentation".to_string(),
                    json!(randomizer.even_presentation),
                );
            }
            FlowNode::EndSurvey => {
                data.insert("Type".to_string(), json!("EndSurvey"));
            }
        }

        let (children, last_id) = compile_children(self.children(), flow_id, blocks)?;
        if !children.is_empty() {
            data.insert("Flow".to_string(), Value::Array(children));
        }
        Ok((Value::Object(data), last_id))
    }
}

impl From<BlockRandomizer> for FlowNode {
    fn from(randomizer: BlockRandomizer) -> Self {
        FlowNode::BlockRandomizer(randomizer)
    }
}

fn resolve_block_id(key: BlockKey, blocks: &[Block]) -> SurveyResult<&str> {
    let block = blocks.get(key.0).ok_or_else(|| {
        SurveyError::UnresolvedReference(format!(
            "flow references block #{} which this survey does not own",
            key.0
        ))
    })?;
    block.id().ok_or_else(|| {
        SurveyError::UnresolvedReference(format!(
            "flow references block #{} ({:?}) which has not been created yet",
            key.0, block.description
        ))
    })
}

fn compile_children(
    children: &[FlowNode],
    mut flow_id: usize,
    blocks: &[Block],
) -> SurveyResult<(Vec<Value>, usize)> {
    let mut rendered = Vec::with_capacity(children.len());
    for child in children {
        let (data, last_id) = child.compile(flow_id + 1, blocks)?;
        rendered.push(data);
        flow_id = last_id;
    }
    Ok((rendered, flow_id))
}

/// The flow of a flow-based survey: the block arena plus the children of the
/// implicit root flow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowTree {
    blocks: Vec<Block>,
    root: Vec<FlowNode>,
}

impl FlowTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of a block without placing it in the flow yet.
    pub fn add_block(&mut self, block: Block) -> BlockKey {
        self.blocks.push(block);
        BlockKey(self.blocks.len() - 1)
    }

    /// Add a block and present it at the end of the root flow.
    pub fn append_block(&mut self, block: Block) -> BlockKey {
        let key = self.add_block(block);
        self.root.push(FlowNode::block(key));
        key
    }

    pub fn append(&mut self, node: impl Into<FlowNode>) -> &mut FlowNode {
        self.root.push(node.into());
        let last = self.root.len() - 1;
        &mut self.root[last]
    }

    pub fn block(&self, key: BlockKey) -> Option<&Block> {
        self.blocks.get(key.0)
    }

    pub fn block_mut(&mut self, key: BlockKey) -> Option<&mut Block> {
        self.blocks.get_mut(key.0)
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub(crate) fn blocks_mut(&mut self) -> &mut [Block] {
        &mut self.blocks
    }

    pub fn root(&self) -> &[FlowNode] {
        &self.root
    }

    /// Blocks reachable from the flow, in pre-order, each listed once.
    pub fn referenced_blocks(&self) -> Vec<BlockKey> {
        let mut seen = HashSet::new();
        let mut keys = Vec::new();
        for node in &self.root {
            node.collect_block_keys(&mut seen, &mut keys);
        }
        keys
    }

    /// Structural checks that need no network access.
    pub fn validate(&self) -> SurveyResult<()> {
        self.root
            .iter()
            .try_for_each(|node| node.check(self.blocks.len()))
    }

    /// Render the whole flow for the update-flow call. Every referenced block
    /// must already carry its platform ID.
    pub fn render(&self) -> SurveyResult<Value> {
        let root_id = 1;
        let (children, max_id) = compile_children(&self.root, root_id, &self.blocks)?;

        let mut data = Map::new();
        data.insert("FlowID".to_string(), json!(format!("FL_{}", root_id)));
        data.insert("Type".to_string(), json!("Root"));
        if !children.is_empty() {
            data.insert("Flow".to_string(), Value::Array(children));
        }
        data.insert(
            "Properties".to_string(),
            json!({
                "Count": max_id,
                "RemovedFieldsets": [],
            }),
        );
        Ok(Value::Object(data))
    }
}

impl FromIterator<Block> for FlowTree {
    fn from_iter<I: IntoIterator<Item = Block>>(iter: I) -> Self {
        let mut tree = FlowTree::new();
        for block in iter {
            tree.append_block(block);
        }
        tree
    }
}
