use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::client::PlatformClient;
use crate::error::SurveyResult;
use crate::logic::block_upload::upload_element;
use crate::logic::Progress;
use crate::model::{Survey, SurveyId, SurveyLinks, SurveyShape};

/// How far a creation run has progressed. Stages only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CreationStage {
    Unbuilt,
    ShellCreated,
    OptionsApplied,
    ContentCreated,
    FlowCreated,
    Done,
}

impl fmt::Display for CreationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CreationStage::Unbuilt => "unbuilt",
            CreationStage::ShellCreated => "shell created",
            CreationStage::OptionsApplied => "options applied",
            CreationStage::ContentCreated => "content created",
            CreationStage::FlowCreated => "flow created",
            CreationStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Outcome of a successful creation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreationResult {
    pub survey_id: SurveyId,
    pub links: SurveyLinks,
    pub blocks_created: usize,
    pub elements_created: usize,
}

/// Drives one survey through the creation sequence against a platform
/// client.
///
/// Each call is awaited before the next request is built, since later
/// requests carry IDs from earlier responses. The first failure stops the
/// run; nothing created before it is rolled back, and `stage` tells how far
/// the run got.
pub struct SurveyCreator<'a, C: PlatformClient + ?Sized> {
    client: &'a C,
    stage: CreationStage,
}

impl<'a, C: PlatformClient + ?Sized> SurveyCreator<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self {
            client,
            stage: CreationStage::Unbuilt,
        }
    }

    pub fn stage(&self) -> CreationStage {
        self.stage
    }

    fn advance(&mut self, stage: CreationStage) {
        self.stage = stage;
    }

    pub async fn create(&mut self, survey: &mut Survey) -> SurveyResult<CreationResult> {
        survey.validate()?;
        survey.reset_ids();
        self.stage = CreationStage::Unbuilt;

        info!("creating survey {:?}", survey.name);
        let survey_id = self.client.create_survey(&survey.name).await?;
        survey.set_id(survey_id.clone());
        info!("survey created with id {}", survey_id);
        self.advance(CreationStage::ShellCreated);

        if !survey.options.is_empty() {
            info!("configuring survey {}", survey_id);
            self.client
                .update_survey_options(&survey_id, &survey.options)
                .await?;
        }
        self.advance(CreationStage::OptionsApplied);

        let (n_blocks, n_elements) = survey.upload_size();
        info!(
            "populating survey: {} blocks, {} elements",
            n_blocks, n_elements
        );
        let mut progress = Progress::new("populating", n_blocks + n_elements);

        match &mut survey.shape {
            SurveyShape::Basic(list) => {
                for element in &mut list.elements {
                    upload_element(self.client, &survey_id, None, element, &mut progress).await?;
                }
                self.advance(CreationStage::ContentCreated);
            }
            SurveyShape::Blocked(list) => {
                for block in &mut list.blocks {
                    let block_id = block.create_empty(self.client, &survey_id).await?;
                    progress.tick(&format!("block {}", block_id));
                    block
                        .populate_with_progress(self.client, &survey_id, &mut progress)
                        .await?;
                }
                self.advance(CreationStage::ContentCreated);
            }
            SurveyShape::Flow(tree) => {
                let referenced = tree.referenced_blocks();
                let unreferenced = tree.blocks().len() - referenced.len();
                if unreferenced > 0 {
                    warn!(
                        "{} block(s) are not reachable from the flow and will not be created",
                        unreferenced
                    );
                }

                for key in referenced {
                    if let Some(block) = tree.block_mut(key) {
                        let block_id = block.create_empty(self.client, &survey_id).await?;
                        progress.tick(&format!("block {}", block_id));
                        block
                            .populate_with_progress(self.client, &survey_id, &mut progress)
                            .await?;
                    }
                }
                self.advance(CreationStage::ContentCreated);

                info!("reflowing survey {}", survey_id);
                let flow = tree.render()?;
                self.client.update_flow(&survey_id, &flow).await?;
                self.advance(CreationStage::FlowCreated);
            }
        }
        info!("survey {} populated", survey_id);

        let links = self.client.links(&survey_id);
        info!("edit survey here: {}", links.editor);
        info!("preview survey here: {}", links.preview);
        self.advance(CreationStage::Done);

        Ok(CreationResult {
            survey_id,
            links,
            blocks_created: n_blocks,
            elements_created: n_elements,
        })
    }
}

impl Survey {
    /// Create this survey on the platform as a brand-new remote survey.
    ///
    /// IDs from any earlier run are discarded first, so calling this twice
    /// produces two independent remote surveys.
    pub async fn create<C>(&mut self, client: &C) -> SurveyResult<CreationResult>
    where
        C: PlatformClient + ?Sized,
    {
        SurveyCreator::new(client).create(self).await
    }
}
