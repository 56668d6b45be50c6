// src/mercados/mercado_structs.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Mercado (loja) cadastrado no sistema. Todos os dados pertencem a um mercado.
#[derive(Debug, Serialize, FromRow)]
pub struct Mercado {
    pub id: i32,
    pub nome: String,
    pub cnpj: String,
    pub ie: String,
    pub endereco: String,
    pub cidade: String,
    pub telefone: String,
    pub created_at: DateTime<Utc>,
}

/// Dados da loja no formulário de cadastro.
#[derive(Debug, Deserialize)]
pub struct NovoMercado {
    pub nome: String,
    #[serde(default)]
    pub cnpj: String,
    #[serde(default)]
    pub ie: String,
    #[serde(default)]
    pub endereco: String,
    #[serde(default)]
    pub cidade: String,
    #[serde(default)]
    pub telefone: String,
}

/// Conta do dono criada junto com o mercado.
#[derive(Debug, Deserialize)]
pub struct NovoDono {
    pub nome: String,
    pub email: String,
    pub senha: String,
    pub confirmar_senha: String,
}

#[derive(Debug, Deserialize)]
pub struct CadastroMercado {
    pub mercado: NovoMercado,
    pub dono: NovoDono,
}

impl CadastroMercado {
    /// Valida os campos obrigatórios do cadastro.
    pub fn validar(&self) -> Result<(), String> {
        if self.mercado.nome.trim().is_empty() {
            return Err("O nome do mercado é obrigatório.".to_string());
        }
        if self.dono.nome.trim().is_empty() || self.dono.email.trim().is_empty() {
            return Err("Nome e e-mail do responsável são obrigatórios.".to_string());
        }
        if !self.dono.email.contains('@') {
            return Err("E-mail inválido.".to_string());
        }
        if self.dono.senha != self.dono.confirmar_senha {
            return Err("As senhas não coincidem.".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cadastro(senha: &str, confirmar: &str) -> CadastroMercado {
        CadastroMercado {
            mercado: NovoMercado {
                nome: "Mercadinho".to_string(),
                cnpj: String::new(),
                ie: String::new(),
                endereco: String::new(),
                cidade: String::new(),
                telefone: String::new(),
            },
            dono: NovoDono {
                nome: "Rita".to_string(),
                email: "rita@mercadinho.com".to_string(),
                senha: senha.to_string(),
                confirmar_senha: confirmar.to_string(),
            },
        }
    }

    #[test]
    fn senhas_diferentes_sao_rejeitadas() {
        assert_eq!(
            cadastro("segredo1", "segredo2").validar(),
            Err("As senhas não coincidem.".to_string())
        );
        assert!(cadastro("segredo1", "segredo1").validar().is_ok());
    }

    #[test]
    fn mercado_sem_nome_e_rejeitado() {
        let mut c = cadastro("segredo1", "segredo1");
        c.mercado.nome = "  ".to_string();
        assert!(c.validar().is_err());
    }
}
