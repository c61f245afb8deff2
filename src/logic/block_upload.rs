use log::debug;

use crate::client::PlatformClient;
use crate::error::{SurveyError, SurveyResult};
use crate::logic::Progress;
use crate::model::{Block, BlockId, Element, ElementKind};

/// Upload one element into `block_id` (the default block when `None`).
/// Questions keep the ID the platform hands back.
pub(crate) async fn upload_element<C>(
    client: &C,
    survey_id: &str,
    block_id: Option<&str>,
    element: &mut Element,
    progress: &mut Progress,
) -> SurveyResult<()>
where
    C: PlatformClient + ?Sized,
{
    match &element.kind {
        ElementKind::PageBreak => {
            client.create_page_break(survey_id, block_id).await?;
            progress.tick("page break");
        }
        ElementKind::Question(question) => {
            let id = client
                .create_element(survey_id, block_id, &question.render())
                .await?;
            progress.tick(&format!("{} question {}", question.type_name(), id));
            element.assign_id(id);
        }
    }
    Ok(())
}

impl Block {
    /// Create this block remotely with no elements and keep its new ID.
    ///
    /// The platform will not take a block's questions at creation time, so
    /// the elements follow in [`Block::populate`]. A block that already has
    /// an ID is refused.
    pub async fn create_empty<C>(&mut self, client: &C, survey_id: &str) -> SurveyResult<BlockId>
    where
        C: PlatformClient + ?Sized,
    {
        if let Some(existing) = self.id() {
            return Err(SurveyError::Configuration(format!(
                "block {:?} already exists as {}",
                self.description, existing
            )));
        }
        let id = client.create_block(survey_id, &self.description).await?;
        debug!("block {:?} created as {}", self.description, id);
        self.assign_id(id.clone());
        Ok(id)
    }

    /// Create every element of this block, in order, inside the remote block.
    /// Runs at most once per created block.
    pub async fn populate<C>(&mut self, client: &C, survey_id: &str) -> SurveyResult<()>
    where
        C: PlatformClient + ?Sized,
    {
        self.populate_with_progress(client, survey_id, &mut Progress::silent())
            .await
    }

    pub(crate) async fn populate_with_progress<C>(
        &mut self,
        client: &C,
        survey_id: &str,
        progress: &mut Progress,
    ) -> SurveyResult<()>
    where
        C: PlatformClient + ?Sized,
    {
        let block_id = match self.id() {
            Some(id) => id.to_string(),
            None => {
                return Err(SurveyError::UnresolvedReference(format!(
                    "block {:?} has not been created yet",
                    self.description
                )))
            }
        };
        if self.is_populated() {
            return Err(SurveyError::Configuration(format!(
                "block {} has already been populated",
                block_id
            )));
        }

        for element in self.elements_mut() {
            upload_element(client, survey_id, Some(&block_id), element, progress).await?;
        }
        self.mark_populated();
        Ok(())
    }
}
