mod pipeline;
mod resume;
mod support;
