pub mod admin_user;
pub mod auth_session;
pub mod bem_patrimonial;
pub mod edital;
pub mod movimentacao;
pub mod noticia;
