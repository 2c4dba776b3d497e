pub mod arxiv;
