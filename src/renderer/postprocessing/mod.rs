mod copy;

pub use copy::CopyRenderPass;
