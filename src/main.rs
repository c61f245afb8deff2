use anyhow::Context;
use qualtrics_builder::config::AppConfig;
use qualtrics_builder::{
    Block, MultipleChoiceQuestion, RecordingClient, ResponseSize, SliderQuestion, Sliders,
    Survey, TextEntryQuestion,
};

const NUM_BLOCKS: usize = 3;
const NUM_QUESTION_PAGES_PER_BLOCK: usize = 10;

/// Three blocks of ten pages, each page holding a multiple choice, a slider
/// and a text entry question.
fn demo_survey(name: &str) -> anyhow::Result<Survey> {
    let mut survey = Survey::blocked(name);
    survey
        .options
        .set_show_back_button(true)
        .set_progress_bar_display("VerboseText");

    let blocks = survey
        .as_blocked_mut()
        .context("demo survey is block-based")?;
    for i in 0..NUM_BLOCKS {
        let block = blocks.append(Block::new(format!("Demo block {}", i + 1)));
        for page in 0..NUM_QUESTION_PAGES_PER_BLOCK {
            block.append(
                MultipleChoiceQuestion::new(
                    format!("Q{}.{}.1", i, page),
                    ["Choice 1", "Choice 2", "Choice 3"],
                )
                .with_text("Select a choice")
                .with_force_response(true),
            )?;
            block.append(SliderQuestion::new(
                format!("Q{}.{}.2", i, page),
                "Rate your answer from 0 to 100",
                Sliders::Count(1),
            ))?;
            block.append(
                TextEntryQuestion::new(format!("Q{}.{}.3", i, page), "Text input")
                    .with_size(ResponseSize::MultiLine)
                    .with_force_response(true),
            )?;
            block.append_page_break()?;
        }
    }
    Ok(survey)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::load()?;
    let mut survey = demo_survey(&config.survey.name)?;

    if config.survey.dry_run {
        let client = RecordingClient::new();
        let result = survey.create(&client).await?;
        for (i, call) in client.calls().iter().enumerate() {
            println!("{:>4}. {}", i + 1, call);
        }
        println!(
            "dry run: {} calls, {} blocks, {} elements",
            client.calls().len(),
            result.blocks_created,
            result.elements_created
        );
        return Ok(());
    }

    let client = config.qualtrics_client()?;
    let result = survey
        .create(&client)
        .await
        .context("survey upload failed")?;

    println!("survey id: {}", result.survey_id);
    println!("edit:      {}", result.links.editor);
    println!("preview:   {}", result.links.preview);

    Ok(())
}
