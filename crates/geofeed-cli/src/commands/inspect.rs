use crate::commands::SourceArgs;
use clap::Args;
use geofeed_model::{EntityModel, EntityModelBuilder};

#[derive(Args, Debug)]
pub struct InspectCommand {
    /// Pretty-print the JSON output
    #[arg(long)]
    pub pretty: bool,

    #[command(flatten)]
    pub source: SourceArgs,
}

impl InspectCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        let rt = tokio::runtime::Runtime::new()?;
        let model = rt.block_on(self.load_model())?;

        let output = if self.pretty {
            serde_json::to_string_pretty(&model)?
        } else {
            serde_json::to_string(&model)?
        };
        println!("{}", output);

        Ok(())
    }

    async fn load_model(&self) -> anyhow::Result<EntityModel> {
        let source = self.source.build()?;
        let model = EntityModelBuilder::new(source).build_entities().await?;
        Ok(model)
    }
}
