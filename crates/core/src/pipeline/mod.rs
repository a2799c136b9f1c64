pub mod add_text_use_case;
