use rgen_studio::{
    BedrockClient, BedrockConfig, GenerationRequest, ImageModel, NormalizedImage, Session,
    SourceImage, StylePreset,
};
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_loaded = dotenv::dotenv().is_ok();
    rgen_studio::logger::init()?;
    if dotenv_loaded {
        log::info!("✅ .env file loaded");
    } else {
        log::warn!("⚠️  No .env file found");
    }

    let photo = env::args().nth(1).ok_or("usage: stylize <photo.png|jpg> [style]")?;
    let style: StylePreset = env::args()
        .nth(2)
        .unwrap_or_else(|| "anime".to_string())
        .parse()?;

    let region = env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string());
    let client = BedrockClient::new(BedrockConfig::from_env().with_region(&region)).await?;

    let source = SourceImage::from_path(&photo)?;
    let request = GenerationRequest::for_model(ImageModel::TitanV1, "profile picture")
        .with_style(style)
        .with_conditioning_image(NormalizedImage::from_source(&source)?);

    let mut session = Session::for_client(&client);
    match session.submit(&client, &request).await {
        Ok(result) => {
            let name = result.file_name();
            result.save_png(&name)?;
            println!("{}", name);
        }
        Err(feedback) => eprintln!("{}", feedback),
    }

    Ok(())
}
