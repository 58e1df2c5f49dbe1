use crate::engine::FillClient;
use crate::error::Result;
use crate::models::{FramePair, GenerationRequest};
use futures::StreamExt;
use image::RgbaImage;

/// Call contract of the interactive UI collaborator. The session tells the
/// view what to change; how widgets are drawn is the view's business.
pub trait SessionView: Send {
    fn clear_result(&mut self);
    fn set_reuse_visible(&mut self, visible: bool);
    fn show_pair(&mut self, pair: &FramePair);
}

/// Drives one user action as an explicit transition sequence: clear the
/// result panel, hide the reuse button, stream every pair to the view, then
/// show the reuse button again. One logical request at a time.
pub struct Session<V: SessionView> {
    view: V,
    last_output: Option<RgbaImage>,
}

impl<V: SessionView> Session<V> {
    pub fn new(view: V) -> Self {
        Self {
            view,
            last_output: None,
        }
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub async fn run(&mut self, client: &FillClient, request: GenerationRequest) -> Result<()> {
        self.view.clear_result();
        self.view.set_reuse_visible(false);
        self.last_output = None;

        let outcome = self.drive(client, request).await;

        // the reuse control comes back whether or not the run succeeded
        self.view.set_reuse_visible(true);
        outcome
    }

    async fn drive(&mut self, client: &FillClient, request: GenerationRequest) -> Result<()> {
        let mut pairs = client.generate(request).await?;

        while let Some(item) = pairs.next().await {
            let pair = item?;
            self.view.show_pair(&pair);
            if pair.is_final() {
                self.last_output = Some(pair.right.clone());
            }
        }

        Ok(())
    }

    /// The "reuse output as new input" action: the terminal pair's second
    /// image becomes the next request's source.
    pub fn use_output_as_input(&self) -> Option<RgbaImage> {
        self.last_output.clone()
    }
}
